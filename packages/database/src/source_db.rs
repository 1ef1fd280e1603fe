//! Reads `(id, WKT)` rows from an embedded `DuckDB` database.
//!
//! The source file is opened read-only. Geometry can live in a plain text
//! column or, with the `spatial` extension loaded, in a native `GEOMETRY`
//! column that is converted with `ST_AsText` on the way out.

use std::path::Path;

use duckdb::{AccessMode, Config, Connection};
use geochunk_models::SourceRow;

use crate::DbError;
use crate::sql::quote_ident;

/// Which rows to read and how to project them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    /// Source table, optionally schema-qualified.
    pub table: String,
    /// Column holding the row identifier (cast to text).
    pub id_column: String,
    /// Column holding the geometry.
    pub geometry_column: String,
    /// Extra SQL predicate appended with `AND`.
    pub filter: Option<String>,
    /// Maximum number of rows to read.
    pub limit: Option<u64>,
    /// `true` if the geometry column is a spatial `GEOMETRY` rather than
    /// WKT text.
    pub native_geometry: bool,
}

impl SourceQuery {
    /// Reads `id` and `geometry` text columns from `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_column: "id".to_string(),
            geometry_column: "geometry".to_string(),
            filter: None,
            limit: None,
            native_geometry: false,
        }
    }

    fn from_where(&self) -> Result<String, DbError> {
        let table = quote_ident(&self.table)?;
        let id = quote_ident(&self.id_column)?;
        let geometry = quote_ident(&self.geometry_column)?;

        let mut sql = format!("FROM {table} WHERE {id} IS NOT NULL AND {geometry} IS NOT NULL");
        if let Some(filter) = &self.filter {
            sql.push_str(&format!(" AND ({filter})"));
        }
        Ok(sql)
    }

    /// `SELECT` producing `(id, wkt)` rows in id order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] if a name cannot be quoted.
    pub fn select_sql(&self) -> Result<String, DbError> {
        let id = quote_ident(&self.id_column)?;
        let geometry = quote_ident(&self.geometry_column)?;
        let projection = if self.native_geometry {
            format!("ST_AsText({geometry})")
        } else {
            format!("CAST({geometry} AS VARCHAR)")
        };

        let mut sql = format!(
            "SELECT CAST({id} AS VARCHAR), {projection} {} ORDER BY {id}",
            self.from_where()?
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(sql)
    }

    /// `SELECT COUNT(*)` over the same rows as [`Self::select_sql`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] if a name cannot be quoted.
    pub fn count_sql(&self) -> Result<String, DbError> {
        let mut sql = format!("SELECT COUNT(*) {}", self.from_where()?);
        if let Some(limit) = self.limit {
            sql = format!("SELECT LEAST(({sql}), {limit})");
        }
        Ok(sql)
    }
}

/// Read-only handle on a source database.
pub struct SourceReader {
    conn: Connection,
}

impl SourceReader {
    /// Opens the `DuckDB` file at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file is missing, cannot be opened, or the
    /// `spatial` extension cannot be loaded.
    pub fn open(path: &Path, load_spatial: bool) -> Result<Self, DbError> {
        if !path.exists() {
            return Err(DbError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source database not found: {}", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            Config::default().access_mode(AccessMode::ReadOnly)?,
        )?;
        log::info!("Opened source database {}", path.display());

        Self::from_connection(conn, load_spatial)
    }

    /// Wraps an existing connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the `spatial` extension cannot be loaded.
    pub fn from_connection(conn: Connection, load_spatial: bool) -> Result<Self, DbError> {
        if load_spatial {
            load_spatial_extension(&conn)?;
        }
        Ok(Self { conn })
    }

    /// Number of rows `query` will yield.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn count(&self, query: &SourceQuery) -> Result<u64, DbError> {
        let count: i64 = self
            .conn
            .prepare(&query.count_sql()?)?
            .query_row([], |row| row.get(0))?;
        u64::try_from(count).map_err(|e| DbError::Conversion {
            message: format!("negative row count {count}: {e}"),
        })
    }

    /// Streams the rows of `query` through `f`.
    ///
    /// The iterator borrows the prepared statement, so all consumption must
    /// happen inside the closure.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query cannot be prepared or started.
    /// Errors on individual rows are yielded by the iterator.
    pub fn with_rows<R>(
        &self,
        query: &SourceQuery,
        f: impl FnOnce(&mut dyn Iterator<Item = Result<SourceRow, duckdb::Error>>) -> R,
    ) -> Result<R, DbError> {
        let sql = query.select_sql()?;
        log::debug!("Source query: {sql}");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map([], |row| {
            Ok(SourceRow {
                id: row.get(0)?,
                geometry: row.get(1)?,
            })
        })?;

        Ok(f(&mut rows))
    }
}

/// Loads the `spatial` extension, installing it first if needed.
fn load_spatial_extension(conn: &Connection) -> Result<(), DbError> {
    if conn.execute_batch("LOAD spatial;").is_ok() {
        log::info!("Loaded DuckDB spatial extension");
        return Ok(());
    }

    log::info!("Installing DuckDB spatial extension...");
    conn.execute_batch("INSTALL spatial; LOAD spatial;")?;
    log::info!("Loaded DuckDB spatial extension");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SourceReader {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE shapes (gid INTEGER, wkt TEXT, kind TEXT);
             INSERT INTO shapes VALUES
                (2, 'POLYGON((2 2,3 2,3 3,2 2))', 'b'),
                (1, 'POLYGON((0 0,1 0,1 1,0 0))', 'a'),
                (3, NULL, 'a'),
                (4, 'POLYGON((4 4,5 4,5 5,4 4))', 'a');",
        )
        .unwrap();
        SourceReader::from_connection(conn, false).unwrap()
    }

    fn query() -> SourceQuery {
        SourceQuery {
            id_column: "gid".to_string(),
            geometry_column: "wkt".to_string(),
            ..SourceQuery::new("shapes")
        }
    }

    #[test]
    fn streams_rows_in_id_order_skipping_nulls() {
        let reader = seeded();
        let rows: Vec<SourceRow> = reader
            .with_rows(&query(), |rows| rows.collect::<Result<Vec<_>, _>>())
            .unwrap()
            .unwrap();

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(rows[0].geometry, "POLYGON((0 0,1 0,1 1,0 0))");
        assert_eq!(reader.count(&query()).unwrap(), 3);
    }

    #[test]
    fn filter_and_limit_apply_to_rows_and_count() {
        let reader = seeded();
        let query = SourceQuery {
            filter: Some("kind = 'a'".to_string()),
            limit: Some(1),
            ..query()
        };

        let ids: Vec<String> = reader
            .with_rows(&query, |rows| rows.map(|r| r.unwrap().id).collect())
            .unwrap();
        assert_eq!(ids, vec!["1".to_string()]);
        assert_eq!(reader.count(&query).unwrap(), 1);
    }

    #[test]
    fn native_geometry_uses_st_astext() {
        let sql = SourceQuery {
            native_geometry: true,
            ..SourceQuery::new("main.parcels")
        }
        .select_sql()
        .unwrap();
        assert!(sql.contains("ST_AsText(\"geometry\")"), "{sql}");
        assert!(sql.contains("FROM \"main\".\"parcels\""), "{sql}");
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("geochunk_missing_source.duckdb");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            SourceReader::open(&path, false),
            Err(DbError::Io(_))
        ));
    }
}
