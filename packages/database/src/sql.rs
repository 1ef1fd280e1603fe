//! SQL text shared by the `DuckDB` sink and the dry-run sink.

use crate::DbError;
use crate::dest_db::TableNames;

/// Columns of the original-row table, in insert order.
pub const ORIGINAL_COLUMNS: &[&str] = &["id", "area", "wkt_length", "wkb_length", "chunk_ct"];

/// Columns of the part table, in insert order.
pub const PART_COLUMNS: &[&str] = &[
    "id",
    "chunk_id",
    "area",
    "wkt_length",
    "wkb_length",
    "geometry",
];

/// Quotes a possibly schema-qualified identifier (`schema.table`).
///
/// Each dot-separated segment is wrapped in double quotes with embedded
/// quotes doubled.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] for empty names, empty segments,
/// or names containing NUL.
pub fn quote_ident(name: &str) -> Result<String, DbError> {
    let invalid = || DbError::InvalidIdentifier {
        name: name.to_string(),
    };

    if name.contains('\0') {
        return Err(invalid());
    }

    let segments = name
        .split('.')
        .map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                Err(invalid())
            } else {
                Ok(format!("\"{}\"", segment.replace('"', "\"\"")))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(segments.join("."))
}

/// DDL creating both destination tables.
///
/// With `replace`, existing tables are dropped and recreated; otherwise
/// they are created only if missing and new rows are appended.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] if a table name is invalid.
pub fn create_tables_sql(tables: &TableNames, replace: bool) -> Result<String, DbError> {
    let create = if replace {
        "CREATE OR REPLACE TABLE"
    } else {
        "CREATE TABLE IF NOT EXISTS"
    };
    let originals = quote_ident(&tables.originals)?;
    let parts = quote_ident(&tables.parts)?;

    Ok(format!(
        "{create} {originals} (
            id TEXT NOT NULL,
            area DOUBLE,
            wkt_length INTEGER,
            wkb_length INTEGER,
            chunk_ct INTEGER
        );

        {create} {parts} (
            id TEXT NOT NULL,
            chunk_id INTEGER NOT NULL,
            area DOUBLE,
            wkt_length INTEGER,
            wkb_length INTEGER,
            geometry TEXT
        );"
    ))
}

/// Multi-row parameterized `INSERT` for `rows` rows of `columns`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] if the table name is invalid.
pub fn insert_sql(table: &str, columns: &[&str], rows: usize) -> Result<String, DbError> {
    let table = quote_ident(table)?;
    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));

    let mut sql = format!("INSERT INTO {table} ({}) VALUES ", columns.join(", "));
    for i in 0..rows {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&placeholders);
    }
    Ok(sql)
}
