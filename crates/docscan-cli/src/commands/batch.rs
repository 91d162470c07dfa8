//! Batch command - extract text from many documents concurrently.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use docscan_core::{ExtractionPipeline, ExtractionRequest, SupportedFormat};

use super::load_config;
use crate::GlobalArgs;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Directory for `<file name>.txt` outputs (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of documents processed at once
    #[arg(short = 'j', long, default_value = "2")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    pages: usize,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(global)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && SupportedFormat::from_path(p) != SupportedFormat::Unsupported)
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let jobs = plan_outputs(files, args.output_dir.as_deref())?;

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(jobs.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    // One pipeline for the whole batch so engines are shared across files.
    let pipeline = Arc::new(ExtractionPipeline::from_config(&config));
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();
    let mut results = Vec::new();

    for (path, output_path) in jobs {
        let permit = permits.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let outcome = pipeline
                .extract_pages(ExtractionRequest::Path(path.clone()))
                .map_err(anyhow::Error::from)
                .and_then(|result| {
                    fs::write(&output_path, result.text())?;
                    debug!("Wrote output to {}", output_path.display());
                    Ok(result.page_count())
                });

            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            match outcome {
                Ok(pages) => FileOutcome {
                    path,
                    pages,
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileOutcome {
                    path,
                    pages: 0,
                    error: Some(format!("{:#}", e)),
                    processing_time_ms,
                },
            }
        });

        // Surface completed failures early when we are not continuing past them.
        while let Some(done) = tasks.try_join_next() {
            let outcome = done?;
            overall_pb.inc(1);
            check_outcome(&outcome, args.continue_on_error)?;
            results.push(outcome);
        }
    }

    while let Some(done) = tasks.join_next().await {
        let outcome = done?;
        overall_pb.inc(1);
        check_outcome(&outcome, args.continue_on_error)?;
        results.push(outcome);
    }

    overall_pb.finish_with_message("Complete");

    print_summary(&results, start);
    Ok(())
}

/// Output file for `input`: its full file name plus `.txt`, so inputs that
/// differ only by extension do not overwrite each other.
fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}.txt", name))
}

/// Pair every input with its output path, refusing the batch when two
/// inputs would write the same file.
fn plan_outputs(
    files: Vec<PathBuf>,
    output_dir: Option<&Path>,
) -> anyhow::Result<Vec<(PathBuf, PathBuf)>> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut plan = Vec::with_capacity(files.len());

    for input in files {
        let output = output_path_for(&input, output_dir);
        if let Some(first) = claimed.get(&output) {
            anyhow::bail!(
                "{} and {} would both write {}",
                first.display(),
                input.display(),
                output.display()
            );
        }
        claimed.insert(output.clone(), input.clone());
        plan.push((input, output));
    }

    Ok(plan)
}

fn check_outcome(outcome: &FileOutcome, continue_on_error: bool) -> anyhow::Result<()> {
    let Some(error_msg) = &outcome.error else {
        return Ok(());
    };

    if continue_on_error {
        warn!("Failed to process {}: {}", outcome.path.display(), error_msg);
        Ok(())
    } else {
        error!("Failed to process {}: {}", outcome.path.display(), error_msg);
        anyhow::bail!("Processing failed for {}: {}", outcome.path.display(), error_msg)
    }
}

fn print_summary(results: &[FileOutcome], start: Instant) {
    let successful: Vec<_> = results.iter().filter(|r| r.error.is_none()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let pages: usize = successful.iter().map(|r| r.pages).sum();

    eprintln!();
    eprintln!(
        "{} Processed {} files ({} pages) in {:?}",
        style("✓").green(),
        results.len(),
        pages,
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    for result in &successful {
        debug!(
            "{}: {} page(s) in {}ms",
            result.path.display(),
            result.pages,
            result.processing_time_ms
        );
    }

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
