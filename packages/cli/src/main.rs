#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for size-bounded polygon chunking.
//!
//! ```text
//! geochunk chunk --source in.duckdb --table parcels --dest out.duckdb [--max-len 64000]
//! geochunk chunk --config geochunk.toml [--dry-run]
//! geochunk split --wkt @shape.wkt --max-len 4000 [--consolidate]
//! ```
//!
//! Log output is routed through `indicatif::MultiProgress` (via
//! [`geochunk_cli_utils::init_logger`]) so that skipped-row warnings and
//! the progress bar share the terminal cleanly.

mod config;
mod pipeline;

use std::path::Path;

use clap::{Args, Parser, Subcommand};
use geochunk::PolygonalGeometry;
use geochunk_models::DEFAULT_MAX_LEN;

use crate::config::ChunkArgs;

#[derive(Parser)]
#[command(name = "geochunk", about = "Split polygons into size-bounded WKT parts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk every geometry in a source table into destination tables
    Chunk(ChunkArgs),
    /// Split a single WKT geometry and print each part with its length and area
    Split(SplitArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// WKT text, or `@path` to read it from a file
    #[arg(long)]
    wkt: String,
    /// Maximum WKT length of any part
    #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
    max_len: usize,
    /// Merge small parts back together after splitting
    #[arg(long)]
    consolidate: bool,
}

/// Resolves `@path` arguments to file contents.
fn read_wkt_arg(arg: &str) -> std::io::Result<String> {
    arg.strip_prefix('@').map_or_else(
        || Ok(arg.to_string()),
        |path| std::fs::read_to_string(Path::new(path)).map(|text| text.trim().to_string()),
    )
}

/// One tab-separated output line: chunk id, WKT length, geodesic area, WKT.
fn describe_part(chunk_id: usize, part: &str) -> String {
    let area = PolygonalGeometry::parse(part).map_or_else(
        |_| "NULL".to_string(),
        |geometry| format!("{:.3}", geochunk::geodesic_area(&geometry)),
    );
    format!("{chunk_id}\t{}\t{area}\t{part}", part.len())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = geochunk_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chunk(args) => {
            let config = args.resolve()?;
            let summary = pipeline::run(&config, &multi)?;
            pipeline::print_summary(&summary, config.summary_json)?;
        }
        Commands::Split(args) => {
            let wkt = read_wkt_arg(&args.wkt)?;
            let mut parts = geochunk::split(&wkt, args.max_len)?;
            if args.consolidate {
                parts = geochunk::consolidate(&parts, args.max_len);
            }

            log::info!("Split {} chars into {} parts", wkt.len(), parts.len());
            for (i, part) in parts.iter().enumerate() {
                println!("{}", describe_part(i + 1, part));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_defaults_max_len() {
        let cli = Cli::try_parse_from(["geochunk", "split", "--wkt", "POLYGON EMPTY"]).unwrap();
        let Commands::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.max_len, DEFAULT_MAX_LEN);
        assert!(!args.consolidate);
    }

    #[test]
    fn chunk_flags_parse() {
        let cli = Cli::try_parse_from([
            "geochunk",
            "chunk",
            "--source",
            "in.duckdb",
            "--table",
            "parcels",
            "--dry-run",
            "--max-len",
            "500",
        ])
        .unwrap();
        let Commands::Chunk(args) = cli.command else {
            panic!("expected chunk");
        };
        let config = args.resolve().unwrap();
        assert!(config.dry_run);
        assert_eq!(config.chunk.max_len, 500);
    }

    #[test]
    fn part_lines_carry_length_and_area() {
        let line = describe_part(2, "POLYGON((0 0,1 0,1 1,0 1,0 0))");
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields[0], "2");
        assert_eq!(fields[1], "30");
        assert!(fields[2].parse::<f64>().unwrap() > 1.0e10);
        assert_eq!(fields[3], "POLYGON((0 0,1 0,1 1,0 1,0 0))");

        assert!(describe_part(1, "garbage").contains("\tNULL\t"));
    }

    #[test]
    fn wkt_arg_reads_files() {
        let path = std::env::temp_dir().join("geochunk_wkt_arg_test.wkt");
        std::fs::write(&path, "POLYGON((0 0,1 0,1 1,0 0))\n").unwrap();

        let arg = format!("@{}", path.display());
        assert_eq!(read_wkt_arg(&arg).unwrap(), "POLYGON((0 0,1 0,1 1,0 0))");
        assert_eq!(read_wkt_arg("POINT(0 0)").unwrap(), "POINT(0 0)");

        let _ = std::fs::remove_file(&path);
    }
}
