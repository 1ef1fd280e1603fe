//! The `chunk` subcommand: source database → chunker → sink.

use std::time::Instant;

use geochunk::Chunker;
use geochunk::sink::RecordSink;
use geochunk_cli_utils::{IndicatifProgress, MultiProgress};
use geochunk_database::{DryRunSink, DuckDbSink, SourceReader};
use geochunk_models::ChunkSummary;

use crate::config::RunConfig;

/// Runs a full chunking pass as described by `config`.
///
/// # Errors
///
/// Returns an error if the source cannot be read, any row cannot be
/// chunked, or the destination rejects a write.
pub fn run(
    config: &RunConfig,
    multi: &MultiProgress,
) -> Result<ChunkSummary, Box<dyn std::error::Error>> {
    let chunker = Chunker::new(config.chunk)?;
    let reader = SourceReader::open(&config.source_path, config.load_spatial)?;

    let total = reader.count(&config.query)?;
    log::info!(
        "Chunking {total} rows from {} (max_len={}, batch_size={})",
        config.query.table,
        config.chunk.max_len,
        config.chunk.batch_size
    );

    let start = Instant::now();
    let summary = match &config.dest_path {
        Some(dest) if !config.dry_run => {
            let mut sink = DuckDbSink::open(dest, config.tables.clone(), config.replace)?;
            run_into(&chunker, &reader, config, &mut sink, multi, total)?
        }
        _ => {
            let mut sink = DryRunSink::stdout(config.tables.clone(), config.replace);
            run_into(&chunker, &reader, config, &mut sink, multi, total)?
        }
    };

    log::info!(
        "Chunking complete: {} rows -> {} parts in {:.1}s",
        summary.rows_processed,
        summary.parts_generated,
        start.elapsed().as_secs_f64()
    );

    Ok(summary)
}

fn run_into<S: RecordSink>(
    chunker: &Chunker,
    reader: &SourceReader,
    config: &RunConfig,
    sink: &mut S,
    multi: &MultiProgress,
    total: u64,
) -> Result<ChunkSummary, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::rows_bar(multi, "Chunking geometries");
    progress.set_total(total);

    let summary = reader.with_rows(&config.query, |rows| chunker.run(rows, sink, progress.as_ref()))??;

    Ok(summary)
}

/// Prints the run summary to stdout, as a table or as JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_summary(summary: &ChunkSummary, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{:<24} {}", "Rows processed", summary.rows_processed);
    println!("{:<24} {}", "Rows skipped", summary.rows_skipped);
    println!("{:<24} {}", "Parts generated", summary.parts_generated);
    println!("{:<24} {:.3}", "Original area (m^2)", summary.total_original_area);
    println!("{:<24} {:.3}", "Part area (m^2)", summary.total_part_area);
    println!("{:<24} {:.6}", "Area difference (m^2)", summary.area_difference());
    println!("{:<24} {:.8}%", "Area difference", summary.area_difference_pct());
    Ok(())
}
