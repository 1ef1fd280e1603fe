#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` row source and record sinks for geochunk.
//!
//! [`source_db`] streams `(id, WKT)` rows out of an embedded `DuckDB` file,
//! optionally loading the `spatial` extension to read native geometry
//! columns. [`dest_db`] writes chunking output into two tables with batched
//! multi-row inserts, and [`dry_run`] prints the statements it would run
//! instead of executing them.

pub mod dest_db;
pub mod dry_run;
pub mod source_db;
pub mod sql;

use std::path::Path;

pub use dest_db::{DuckDbSink, TableNames};
pub use dry_run::DryRunSink;
pub use source_db::{SourceQuery, SourceReader};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` query or connection error.
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// Filesystem or output stream error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A table or column name that cannot be safely quoted.
    #[error("Invalid identifier: {name:?}")]
    InvalidIdentifier {
        /// The rejected name.
        name: String,
    },

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
