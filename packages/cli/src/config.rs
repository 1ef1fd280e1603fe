//! Run configuration: TOML file plus command-line overrides.
//!
//! Every setting can come from a `[source]`, `[destination]`, or `[chunk]`
//! table in the config file. Flags given on the command line win.

use std::path::{Path, PathBuf};

use clap::Args;
use geochunk_database::{SourceQuery, TableNames};
use geochunk_models::ChunkConfig;
use serde::Deserialize;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required setting was given neither in the file nor as a flag.
    #[error("Missing required setting `{setting}` (use --{flag} or the config file)")]
    Missing {
        /// Dotted config-file key.
        setting: &'static str,
        /// Equivalent command-line flag.
        flag: &'static str,
    },
}

/// Contents of a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Where rows come from.
    pub source: SourceSection,
    /// Where records go.
    pub destination: DestinationSection,
    /// Chunking tunables.
    pub chunk: ChunkConfig,
}

/// `[source]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    /// Source `DuckDB` file.
    pub path: Option<PathBuf>,
    /// Source table.
    pub table: Option<String>,
    /// Identifier column.
    pub id_column: Option<String>,
    /// Geometry column.
    pub geometry_column: Option<String>,
    /// Geometry column uses the spatial `GEOMETRY` type.
    pub native_geometry: bool,
    /// Load the `spatial` extension before reading.
    pub load_spatial: bool,
    /// Extra SQL predicate.
    pub filter: Option<String>,
    /// Maximum rows to read.
    pub limit: Option<u64>,
}

/// `[destination]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestinationSection {
    /// Destination `DuckDB` file.
    pub path: Option<PathBuf>,
    /// Table receiving one row per source geometry.
    pub originals_table: Option<String>,
    /// Table receiving one row per part.
    pub parts_table: Option<String>,
    /// Drop and recreate the tables instead of appending.
    pub replace: bool,
    /// Print statements instead of executing them.
    pub dry_run: bool,
}

impl FileConfig {
    /// Parses config file contents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed TOML or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

/// Flags for the `chunk` subcommand.
#[derive(Debug, Default, Args)]
pub struct ChunkArgs {
    /// TOML config file with `[source]`, `[destination]`, and `[chunk]` tables
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Source `DuckDB` file
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Source table (may be schema-qualified)
    #[arg(long)]
    pub table: Option<String>,
    /// Identifier column [default: id]
    #[arg(long)]
    pub id_column: Option<String>,
    /// Geometry column [default: geometry]
    #[arg(long)]
    pub geometry_column: Option<String>,
    /// The geometry column is a spatial `GEOMETRY` (read via `ST_AsText`)
    #[arg(long)]
    pub native_geometry: bool,
    /// Load the `DuckDB` spatial extension before reading
    #[arg(long)]
    pub load_spatial: bool,
    /// Extra SQL predicate applied to source rows
    #[arg(long)]
    pub filter: Option<String>,
    /// Maximum number of source rows to process
    #[arg(long)]
    pub limit: Option<u64>,
    /// Destination `DuckDB` file (not needed with --dry-run)
    #[arg(long)]
    pub dest: Option<PathBuf>,
    /// Table for original-row records [default: `geometry_originals`]
    #[arg(long)]
    pub originals_table: Option<String>,
    /// Table for part records [default: `geometry_parts`]
    #[arg(long)]
    pub parts_table: Option<String>,
    /// Drop and recreate destination tables instead of appending
    #[arg(long)]
    pub replace: bool,
    /// Maximum WKT length of any part
    #[arg(long)]
    pub max_len: Option<usize>,
    /// Part records buffered per destination write
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Print the statements that would run instead of writing
    #[arg(long)]
    pub dry_run: bool,
    /// Print the final summary as JSON
    #[arg(long)]
    pub summary_json: bool,
}

/// Fully resolved settings for one `chunk` run.
#[derive(Debug)]
pub struct RunConfig {
    /// Source `DuckDB` file.
    pub source_path: PathBuf,
    /// Load the `spatial` extension before reading.
    pub load_spatial: bool,
    /// Rows to read.
    pub query: SourceQuery,
    /// Destination file; `None` only for dry runs.
    pub dest_path: Option<PathBuf>,
    /// Destination tables.
    pub tables: TableNames,
    /// Drop and recreate destination tables.
    pub replace: bool,
    /// Print instead of write.
    pub dry_run: bool,
    /// Chunking tunables.
    pub chunk: ChunkConfig,
    /// Print the summary as JSON.
    pub summary_json: bool,
}

impl ChunkArgs {
    /// Merges these flags over the config file (if any).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be loaded or a required
    /// setting is missing.
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        self.resolve_with(file)
    }

    /// Merges these flags over an already-loaded config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required setting is missing.
    pub fn resolve_with(self, file: FileConfig) -> Result<RunConfig, ConfigError> {
        let FileConfig {
            source,
            destination,
            chunk,
        } = file;

        let source_path = self.source.or(source.path).ok_or(ConfigError::Missing {
            setting: "source.path",
            flag: "source",
        })?;
        let table = self.table.or(source.table).ok_or(ConfigError::Missing {
            setting: "source.table",
            flag: "table",
        })?;

        let mut query = SourceQuery::new(table);
        if let Some(id_column) = self.id_column.or(source.id_column) {
            query.id_column = id_column;
        }
        if let Some(geometry_column) = self.geometry_column.or(source.geometry_column) {
            query.geometry_column = geometry_column;
        }
        query.filter = self.filter.or(source.filter);
        query.limit = self.limit.or(source.limit);
        query.native_geometry = self.native_geometry || source.native_geometry;

        let dry_run = self.dry_run || destination.dry_run;
        let dest_path = self.dest.or(destination.path);
        if dest_path.is_none() && !dry_run {
            return Err(ConfigError::Missing {
                setting: "destination.path",
                flag: "dest",
            });
        }

        let mut tables = TableNames::default();
        if let Some(originals) = self.originals_table.or(destination.originals_table) {
            tables.originals = originals;
        }
        if let Some(parts) = self.parts_table.or(destination.parts_table) {
            tables.parts = parts;
        }

        Ok(RunConfig {
            source_path,
            load_spatial: self.load_spatial || source.load_spatial || query.native_geometry,
            query,
            dest_path,
            tables,
            replace: self.replace || destination.replace,
            dry_run,
            chunk: ChunkConfig {
                max_len: self.max_len.unwrap_or(chunk.max_len),
                batch_size: self.batch_size.unwrap_or(chunk.batch_size),
            },
            summary_json: self.summary_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use geochunk_models::DEFAULT_BATCH_SIZE;

    use super::*;

    const FILE: &str = r#"
        [source]
        path = "data/parcels.duckdb"
        table = "parcels"
        geometry_column = "geom"
        native_geometry = true

        [destination]
        path = "data/chunks.duckdb"
        parts_table = "parcel_parts"

        [chunk]
        max_len = 32000
    "#;

    #[test]
    fn file_values_fill_in_missing_flags() {
        let config = ChunkArgs::default()
            .resolve_with(FileConfig::parse(FILE).unwrap())
            .unwrap();

        assert_eq!(config.source_path, PathBuf::from("data/parcels.duckdb"));
        assert_eq!(config.query.table, "parcels");
        assert_eq!(config.query.id_column, "id");
        assert_eq!(config.query.geometry_column, "geom");
        assert!(config.query.native_geometry);
        assert!(config.load_spatial);
        assert_eq!(config.tables.originals, "geometry_originals");
        assert_eq!(config.tables.parts, "parcel_parts");
        assert_eq!(config.chunk.max_len, 32_000);
        assert_eq!(config.chunk.batch_size, DEFAULT_BATCH_SIZE);
        assert!(!config.dry_run);
    }

    #[test]
    fn flags_override_file() {
        let args = ChunkArgs {
            table: Some("lakes".to_string()),
            max_len: Some(5_000),
            batch_size: Some(10),
            replace: true,
            ..ChunkArgs::default()
        };
        let config = args.resolve_with(FileConfig::parse(FILE).unwrap()).unwrap();

        assert_eq!(config.query.table, "lakes");
        assert_eq!(config.chunk.max_len, 5_000);
        assert_eq!(config.chunk.batch_size, 10);
        assert!(config.replace);
    }

    #[test]
    fn destination_is_optional_for_dry_runs() {
        let args = ChunkArgs {
            source: Some(PathBuf::from("src.duckdb")),
            table: Some("t".to_string()),
            ..ChunkArgs::default()
        };
        let err = args.resolve_with(FileConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                setting: "destination.path",
                ..
            }
        ));

        let args = ChunkArgs {
            source: Some(PathBuf::from("src.duckdb")),
            table: Some("t".to_string()),
            dry_run: true,
            ..ChunkArgs::default()
        };
        let config = args.resolve_with(FileConfig::default()).unwrap();
        assert!(config.dry_run);
        assert!(config.dest_path.is_none());
    }

    #[test]
    fn missing_source_is_reported() {
        let err = ChunkArgs::default()
            .resolve_with(FileConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("--source"), "{err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[chunk]\nmax_length = 5").is_err());
        assert!(FileConfig::parse("[sources]\npath = \"x\"").is_err());
    }
}
