#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Size-bounded splitting and consolidation of polygon WKT.
//!
//! Takes `(id, WKT)` rows holding polygons or multi-polygons and produces
//! parts whose WKT never exceeds a configured maximum length:
//!
//! 1. [`split::split`] bisects oversized polygons along their longer
//!    bounding-box axis until every part fits.
//! 2. [`consolidate::consolidate`] greedily packs the small parts back into
//!    multi-polygons that still fit.
//! 3. [`area::geodesic_area`] measures originals and parts on the WGS84
//!    ellipsoid so the caller can check that no area was lost.
//!
//! [`chunker::Chunker`] wires the three together over a stream of rows and
//! hands the resulting records to a [`sink::RecordSink`]. This crate knows
//! nothing about databases or command lines.

pub mod area;
pub mod chunker;
pub mod consolidate;
pub mod geometry;
pub mod progress;
pub mod sink;
pub mod split;

pub use area::geodesic_area;
pub use chunker::{Chunker, RowOutput};
pub use consolidate::consolidate;
pub use geometry::PolygonalGeometry;
pub use split::split;

use thiserror::Error;

/// Errors that can occur while chunking geometries.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Geometry text could not be parsed into a polygon or multi-polygon.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// The configuration can never be satisfied for some input.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },

    /// Reading source rows failed.
    #[error("Source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Writing records to the destination failed.
    #[error("Sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ChunkError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
