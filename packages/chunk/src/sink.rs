//! Destination for chunking output.
//!
//! The core never talks to storage directly. A [`RecordSink`] receives
//! batches of finished records and decides what to do with them: write them
//! to a database, print what it would write, or collect them in memory.

use geochunk_models::{OriginalRecord, PartRecord};

/// Receives original-row and per-part records in batches.
///
/// Calls arrive in this order: [`prepare`](Self::prepare) once, then any
/// number of [`write_originals`](Self::write_originals) /
/// [`write_parts`](Self::write_parts) pairs, then [`finish`](Self::finish)
/// once. Every error is fatal to the run; sinks are never retried.
pub trait RecordSink {
    /// Error type surfaced as [`crate::ChunkError::Sink`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create or reset the destination relations.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the destination cannot be prepared.
    fn prepare(&mut self) -> Result<(), Self::Error>;

    /// Append a batch of original-row records.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the write fails.
    fn write_originals(&mut self, records: &[OriginalRecord]) -> Result<(), Self::Error>;

    /// Append a batch of part records.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the write fails.
    fn write_parts(&mut self, records: &[PartRecord]) -> Result<(), Self::Error>;

    /// Called after the last batch.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if finalization fails.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Original-row records in write order.
    pub originals: Vec<OriginalRecord>,
    /// Part records in write order.
    pub parts: Vec<PartRecord>,
    /// Number of `write_parts` calls received.
    pub part_batches: usize,
    /// Whether `prepare` has run.
    pub prepared: bool,
    /// Whether `finish` has run.
    pub finished: bool,
}

impl RecordSink for MemorySink {
    type Error = std::convert::Infallible;

    fn prepare(&mut self) -> Result<(), Self::Error> {
        self.prepared = true;
        Ok(())
    }

    fn write_originals(&mut self, records: &[OriginalRecord]) -> Result<(), Self::Error> {
        self.originals.extend_from_slice(records);
        Ok(())
    }

    fn write_parts(&mut self, records: &[PartRecord]) -> Result<(), Self::Error> {
        self.part_batches += 1;
        self.parts.extend_from_slice(records);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.finished = true;
        Ok(())
    }
}
