//! Writes chunking output into a `DuckDB` database.
//!
//! Two tables are maintained: one row per source geometry and one row per
//! emitted part. Each batch is inserted with multi-row parameterized
//! `INSERT`s inside a single transaction.

use std::path::Path;

use duckdb::Connection;
use geochunk::sink::RecordSink;
use geochunk_models::{OriginalRecord, PartRecord};

use crate::DbError;
use crate::sql::{ORIGINAL_COLUMNS, PART_COLUMNS, create_tables_sql, insert_sql};

/// Number of rows per INSERT statement.
const CHUNK_SIZE: usize = 1_000;

/// Destination table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// One row per source geometry.
    pub originals: String,
    /// One row per emitted part.
    pub parts: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            originals: "geometry_originals".to_string(),
            parts: "geometry_parts".to_string(),
        }
    }
}

/// [`RecordSink`] backed by a `DuckDB` connection.
pub struct DuckDbSink {
    conn: Connection,
    tables: TableNames,
    replace: bool,
    originals_written: u64,
    parts_written: u64,
}

impl DuckDbSink {
    /// Opens (or creates) the destination database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the parent directory or connection cannot be
    /// created.
    pub fn open(path: &Path, tables: TableNames, replace: bool) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            crate::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        log::info!("Opened destination database {}", path.display());

        Ok(Self::from_connection(conn, tables, replace))
    }

    /// Wraps an existing connection.
    #[must_use]
    pub const fn from_connection(conn: Connection, tables: TableNames, replace: bool) -> Self {
        Self {
            conn,
            tables,
            replace,
            originals_written: 0,
            parts_written: 0,
        }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Original-row records written so far.
    #[must_use]
    pub const fn originals_written(&self) -> u64 {
        self.originals_written
    }

    /// Part records written so far.
    #[must_use]
    pub const fn parts_written(&self) -> u64 {
        self.parts_written
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn sql_int(value: usize) -> i64 {
    value as i64
}

impl RecordSink for DuckDbSink {
    type Error = DbError;

    fn prepare(&mut self) -> Result<(), DbError> {
        self.conn
            .execute_batch(&create_tables_sql(&self.tables, self.replace)?)?;
        log::info!(
            "Prepared destination tables {} and {} (replace={})",
            self.tables.originals,
            self.tables.parts,
            self.replace
        );
        Ok(())
    }

    fn write_originals(&mut self, records: &[OriginalRecord]) -> Result<(), DbError> {
        if records.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for chunk in records.chunks(CHUNK_SIZE) {
            let mut stmt = tx.prepare(&insert_sql(
                &self.tables.originals,
                ORIGINAL_COLUMNS,
                chunk.len(),
            )?)?;

            let mut param_idx = 1usize;
            for record in chunk {
                stmt.raw_bind_parameter(param_idx, &record.id)?;
                stmt.raw_bind_parameter(param_idx + 1, record.area)?;
                stmt.raw_bind_parameter(param_idx + 2, sql_int(record.wkt_length))?;
                stmt.raw_bind_parameter(param_idx + 3, sql_int(record.wkb_length))?;
                stmt.raw_bind_parameter(param_idx + 4, sql_int(record.chunk_ct))?;
                param_idx += ORIGINAL_COLUMNS.len();
            }

            stmt.raw_execute()?;
        }
        tx.commit()?;

        self.originals_written += records.len() as u64;
        log::debug!("Wrote {} original records", records.len());
        Ok(())
    }

    fn write_parts(&mut self, records: &[PartRecord]) -> Result<(), DbError> {
        if records.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for chunk in records.chunks(CHUNK_SIZE) {
            let mut stmt = tx.prepare(&insert_sql(&self.tables.parts, PART_COLUMNS, chunk.len())?)?;

            let mut param_idx = 1usize;
            for record in chunk {
                stmt.raw_bind_parameter(param_idx, &record.id)?;
                stmt.raw_bind_parameter(param_idx + 1, sql_int(record.chunk_id))?;
                stmt.raw_bind_parameter(param_idx + 2, record.area)?;
                stmt.raw_bind_parameter(param_idx + 3, sql_int(record.wkt_length))?;
                stmt.raw_bind_parameter(param_idx + 4, record.wkb_length.map(sql_int))?;
                stmt.raw_bind_parameter(param_idx + 5, &record.geometry)?;
                param_idx += PART_COLUMNS.len();
            }

            stmt.raw_execute()?;
        }
        tx.commit()?;

        self.parts_written += records.len() as u64;
        log::debug!("Wrote {} part records", records.len());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DbError> {
        log::info!(
            "Wrote {} original records to {} and {} part records to {}",
            self.originals_written,
            self.tables.originals,
            self.parts_written,
            self.tables.parts
        );
        Ok(())
    }
}
