//! Row-by-row orchestration of split, consolidate, and measure.
//!
//! [`Chunker::run`] walks a stream of source rows strictly in order,
//! buffers the resulting records, and flushes them to a [`RecordSink`]
//! every `batch_size` parts. A row whose original geometry fails to parse
//! is skipped with a warning; configuration, source, and sink errors stop
//! the run.

use geochunk_models::{ChunkConfig, ChunkSummary, OriginalRecord, PartRecord, SourceRow};

use crate::area::geodesic_area;
use crate::consolidate::consolidate;
use crate::progress::ProgressCallback;
use crate::sink::RecordSink;
use crate::split::{check_max_len, split};
use crate::{ChunkError, PolygonalGeometry};

/// Records produced for one source row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutput {
    /// Metadata about the original geometry.
    pub original: OriginalRecord,
    /// One record per emitted part, in `chunk_id` order.
    pub parts: Vec<PartRecord>,
}

/// Splits, consolidates, and measures rows with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Creates a chunker after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::Configuration`] if `max_len` can never be
    /// satisfied or `batch_size` is zero.
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        check_max_len(config.max_len)?;
        if config.batch_size == 0 {
            return Err(ChunkError::configuration("batch_size must be at least 1"));
        }
        Ok(Self { config })
    }

    /// The configuration this chunker was built with.
    #[must_use]
    pub const fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunks a single row.
    ///
    /// Returns `Ok(None)` if the row's geometry does not parse.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::Configuration`] if the geometry cannot be
    /// brought under `max_len`.
    pub fn process_row(&self, row: &SourceRow) -> Result<Option<RowOutput>, ChunkError> {
        let original = match PolygonalGeometry::parse(&row.geometry) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::warn!("Skipping row {}: {e}", row.id);
                return Ok(None);
            }
        };

        let max_len = self.config.max_len;
        let split_parts = split(&row.geometry, max_len).map_err(|e| match e {
            ChunkError::Configuration { message } => ChunkError::Configuration {
                message: format!("row {}: {message}", row.id),
            },
            other => other,
        })?;
        let split_count = split_parts.len();
        let parts = consolidate(&split_parts, max_len);

        log::debug!(
            "Row {}: {} chars -> {split_count} split parts -> {} chunks",
            row.id,
            row.geometry.len(),
            parts.len()
        );

        let parts: Vec<PartRecord> = parts
            .into_iter()
            .enumerate()
            .map(|(i, text)| measure_part(&row.id, i + 1, text))
            .collect();

        Ok(Some(RowOutput {
            original: OriginalRecord {
                id: row.id.clone(),
                area: geodesic_area(&original),
                wkt_length: row.geometry.len(),
                wkb_length: original.wkb_len(),
                chunk_ct: parts.len(),
            },
            parts,
        }))
    }

    /// Chunks every row and writes the records to `sink`.
    ///
    /// # Errors
    ///
    /// * [`ChunkError::Source`] if reading a row fails
    /// * [`ChunkError::Configuration`] if any row cannot be chunked
    /// * [`ChunkError::Sink`] if the sink rejects a write
    pub fn run<I, E, S>(
        &self,
        rows: I,
        sink: &mut S,
        progress: &dyn ProgressCallback,
    ) -> Result<ChunkSummary, ChunkError>
    where
        I: IntoIterator<Item = Result<SourceRow, E>>,
        E: std::error::Error + Send + Sync + 'static,
        S: RecordSink,
    {
        sink.prepare().map_err(sink_error)?;

        let mut summary = ChunkSummary::default();
        let mut buffer = Buffer::default();

        for row in rows {
            let row = row.map_err(|e| ChunkError::Source(Box::new(e)))?;
            progress.inc(1);

            let Some(output) = self.process_row(&row)? else {
                summary.rows_skipped += 1;
                continue;
            };

            summary.rows_processed += 1;
            summary.parts_generated += output.parts.len() as u64;
            summary.total_original_area += output.original.area;
            summary.total_part_area += output.parts.iter().filter_map(|p| p.area).sum::<f64>();

            buffer.originals.push(output.original);
            buffer.parts.extend(output.parts);

            if buffer.parts.len() >= self.config.batch_size {
                buffer.flush(sink)?;
                progress.set_message(format!("{} parts written", summary.parts_generated));
            }
        }

        buffer.flush(sink)?;
        sink.finish().map_err(sink_error)?;

        progress.finish(format!(
            "{} rows -> {} parts",
            summary.rows_processed, summary.parts_generated
        ));
        log_summary(&summary);

        Ok(summary)
    }
}

/// Records waiting for the next sink write.
#[derive(Default)]
struct Buffer {
    originals: Vec<OriginalRecord>,
    parts: Vec<PartRecord>,
}

impl Buffer {
    fn flush<S: RecordSink>(&mut self, sink: &mut S) -> Result<(), ChunkError> {
        if !self.originals.is_empty() {
            sink.write_originals(&self.originals).map_err(sink_error)?;
            self.originals.clear();
        }
        if !self.parts.is_empty() {
            sink.write_parts(&self.parts).map_err(sink_error)?;
            self.parts.clear();
        }
        Ok(())
    }
}

fn sink_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> ChunkError {
    ChunkError::Sink(Box::new(e))
}

/// Builds a part record, falling back to null metrics if the part does not
/// parse.
fn measure_part(id: &str, chunk_id: usize, geometry: String) -> PartRecord {
    let (area, wkb_length) = match PolygonalGeometry::parse(&geometry) {
        Ok(parsed) => (Some(geodesic_area(&parsed)), Some(parsed.wkb_len())),
        Err(e) => {
            log::warn!("Row {id} part {chunk_id}: could not measure part: {e}");
            (None, None)
        }
    };

    PartRecord {
        id: id.to_string(),
        chunk_id,
        area,
        wkt_length: geometry.len(),
        wkb_length,
        geometry,
    }
}

fn log_summary(summary: &ChunkSummary) {
    log::info!(
        "Processed {} rows ({} skipped), generated {} parts",
        summary.rows_processed,
        summary.rows_skipped,
        summary.parts_generated
    );
    log::info!(
        "Total original area: {:.3} m^2, total part area: {:.3} m^2",
        summary.total_original_area,
        summary.total_part_area
    );
    log::info!(
        "Area difference: {:.6} m^2 ({:.8}%)",
        summary.area_difference(),
        summary.area_difference_pct()
    );
}
