//! Print-only sink.
//!
//! [`DryRunSink`] renders the DDL and insert statements the `DuckDB` sink
//! would execute and writes them to a stream (stdout by default) without
//! touching any database.

use std::io::Write;

use geochunk::sink::RecordSink;
use geochunk_models::{OriginalRecord, PartRecord};

use crate::DbError;
use crate::dest_db::TableNames;
use crate::sql::{ORIGINAL_COLUMNS, PART_COLUMNS, create_tables_sql, quote_ident};

/// Geometry text longer than this is abbreviated in the preview.
const GEOMETRY_PREVIEW_LEN: usize = 60;

/// [`RecordSink`] that prints what it would write.
pub struct DryRunSink<W: Write> {
    out: W,
    tables: TableNames,
    replace: bool,
    originals_seen: u64,
    parts_seen: u64,
}

impl DryRunSink<std::io::Stdout> {
    /// Prints to standard output.
    #[must_use]
    pub fn stdout(tables: TableNames, replace: bool) -> Self {
        Self::new(std::io::stdout(), tables, replace)
    }
}

impl<W: Write> DryRunSink<W> {
    /// Prints to `out`.
    #[must_use]
    pub const fn new(out: W, tables: TableNames, replace: bool) -> Self {
        Self {
            out,
            tables,
            replace,
            originals_seen: 0,
            parts_seen: 0,
        }
    }

    /// Original-row records that would have been written.
    #[must_use]
    pub const fn originals_seen(&self) -> u64 {
        self.originals_seen
    }

    /// Part records that would have been written.
    #[must_use]
    pub const fn parts_seen(&self) -> u64 {
        self.parts_seen
    }

    /// Consumes the sink and returns the output stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_insert(&mut self, table: &str, columns: &[&str], rows: usize) -> Result<(), DbError> {
        writeln!(
            self.out,
            "INSERT INTO {} ({}) VALUES ... -- {rows} rows",
            quote_ident(table)?,
            columns.join(", ")
        )?;
        Ok(())
    }
}

fn preview(geometry: &str) -> String {
    if geometry.len() <= GEOMETRY_PREVIEW_LEN {
        return geometry.to_string();
    }
    let mut end = GEOMETRY_PREVIEW_LEN;
    while !geometry.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} chars)", &geometry[..end], geometry.len())
}

impl<W: Write> RecordSink for DryRunSink<W> {
    type Error = DbError;

    fn prepare(&mut self) -> Result<(), DbError> {
        let ddl = create_tables_sql(&self.tables, self.replace)?;
        writeln!(self.out, "-- dry run: no statements are executed")?;
        writeln!(self.out, "{ddl}")?;
        Ok(())
    }

    fn write_originals(&mut self, records: &[OriginalRecord]) -> Result<(), DbError> {
        let table = self.tables.originals.clone();
        self.print_insert(&table, ORIGINAL_COLUMNS, records.len())?;
        for record in records {
            writeln!(
                self.out,
                "--   ({:?}, {}, {}, {}, {})",
                record.id, record.area, record.wkt_length, record.wkb_length, record.chunk_ct
            )?;
        }
        self.originals_seen += records.len() as u64;
        Ok(())
    }

    fn write_parts(&mut self, records: &[PartRecord]) -> Result<(), DbError> {
        let table = self.tables.parts.clone();
        self.print_insert(&table, PART_COLUMNS, records.len())?;
        for record in records {
            let area = record
                .area
                .map_or_else(|| "NULL".to_string(), |a| a.to_string());
            let wkb_length = record
                .wkb_length
                .map_or_else(|| "NULL".to_string(), |n| n.to_string());
            writeln!(
                self.out,
                "--   ({:?}, {}, {area}, {}, {wkb_length}, {:?})",
                record.id,
                record.chunk_id,
                record.wkt_length,
                preview(&record.geometry)
            )?;
        }
        self.parts_seen += records.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DbError> {
        writeln!(
            self.out,
            "-- would write {} original records and {} part records",
            self.originals_seen, self.parts_seen
        )?;
        self.out.flush()?;
        Ok(())
    }
}
