#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record, summary, and configuration types for the geochunk pipeline.
//!
//! These types describe the data that crosses the boundary between the
//! chunking core and the storage layer: source rows coming in, original and
//! per-part records going out, and the final run summary. They carry no
//! geometry logic of their own.

use serde::{Deserialize, Serialize};

/// Default maximum WKT length of any emitted part.
pub const DEFAULT_MAX_LEN: usize = 64_000;

/// Default number of buffered part records per sink write.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// A single `(id, geometry)` row read from the source relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    /// Row identifier, carried through to every output record.
    pub id: String,
    /// Polygon or multi-polygon as WKT.
    pub geometry: String,
}

impl SourceRow {
    /// Creates a source row from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>, geometry: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
        }
    }
}

/// Metadata about one successfully parsed source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalRecord {
    /// Source row identifier.
    pub id: String,
    /// Geodesic area of the original geometry in square meters.
    pub area: f64,
    /// Length of the original WKT in characters.
    pub wkt_length: usize,
    /// Size of the original geometry encoded as WKB, in bytes.
    pub wkb_length: usize,
    /// Number of parts emitted for this row after consolidation.
    pub chunk_ct: usize,
}

/// One size-bounded part of a source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    /// Identifier of the owning [`OriginalRecord`].
    pub id: String,
    /// 1-based position of this part within its row.
    pub chunk_id: usize,
    /// Geodesic area in square meters (`None` if the part failed to parse).
    pub area: Option<f64>,
    /// Length of [`Self::geometry`] in characters.
    pub wkt_length: usize,
    /// WKB size in bytes (`None` if the part failed to parse).
    pub wkb_length: Option<usize>,
    /// The part as WKT.
    pub geometry: String,
}

/// Tunables consumed by the chunking core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkConfig {
    /// Maximum allowed WKT length of any emitted part.
    pub max_len: usize,
    /// Number of part records buffered before each sink write.
    pub batch_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Running totals for a chunking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// Rows whose original geometry parsed and were chunked.
    pub rows_processed: u64,
    /// Rows skipped because the original geometry failed to parse.
    pub rows_skipped: u64,
    /// Total part records emitted.
    pub parts_generated: u64,
    /// Sum of original geodesic areas (square meters).
    pub total_original_area: f64,
    /// Sum of part geodesic areas (square meters).
    pub total_part_area: f64,
}

impl ChunkSummary {
    /// Original area minus part area.
    #[must_use]
    pub fn area_difference(&self) -> f64 {
        self.total_original_area - self.total_part_area
    }

    /// [`Self::area_difference`] as a percentage of the original area.
    ///
    /// Returns `0.0` when the total original area is zero.
    #[must_use]
    pub fn area_difference_pct(&self) -> f64 {
        if self.total_original_area == 0.0 {
            0.0
        } else {
            self.area_difference() / self.total_original_area * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_pct_guards_zero_area() {
        let summary = ChunkSummary {
            total_part_area: 5.0,
            ..ChunkSummary::default()
        };
        assert!((summary.area_difference() + 5.0).abs() < f64::EPSILON);
        assert!(summary.area_difference_pct().abs() < f64::EPSILON);
    }

    #[test]
    fn difference_pct_is_relative_to_original() {
        let summary = ChunkSummary {
            total_original_area: 200.0,
            total_part_area: 199.0,
            ..ChunkSummary::default()
        };
        assert!((summary.area_difference() - 1.0).abs() < 1e-12);
        assert!((summary.area_difference_pct() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ChunkConfig = toml::from_str("max_len = 2000").unwrap();
        assert_eq!(config.max_len, 2000);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(toml::from_str::<ChunkConfig>("max_length = 2000").is_err());
    }

    #[test]
    fn part_record_serializes_null_metrics() {
        let part = PartRecord {
            id: "a".to_string(),
            chunk_id: 1,
            area: None,
            wkt_length: 3,
            wkb_length: None,
            geometry: "bad".to_string(),
        };
        let json = serde_json::to_value(&part).unwrap();
        assert!(json["area"].is_null());
        assert!(json["wkb_length"].is_null());
        assert_eq!(json["chunk_id"], 1);
    }
}
