//! Extract command - recognize the text of a single document.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docscan_core::{
    ExtractionPipeline, ExtractionRequest, ExtractionResult, OcrInput, OcrProcessingError,
};

use super::load_config;
use crate::GlobalArgs;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or image)
    #[arg(required_unless_present_any = ["stdin", "request"])]
    input: Option<PathBuf>,

    /// Read the document bytes from stdin
    #[arg(long, conflicts_with_all = ["input", "request"])]
    stdin: bool,

    /// Read a JSON request ({"fileContent": base64, "filePath": path}) from a file
    #[arg(long, conflicts_with = "input")]
    request: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Joined page text
    Text,
    /// Per-page JSON
    Json,
}

pub async fn run(args: ExtractArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(global)?;
    let request = build_request(&args)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Running OCR...");

    let result = tokio::task::spawn_blocking(move || {
        ExtractionPipeline::from_config(&config).extract_pages(request)
    })
    .await?;

    pb.finish_and_clear();
    let result = result?;

    info!(
        "Extracted {} page(s) in {}ms",
        result.page_count(),
        start.elapsed().as_millis()
    );

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn build_request(args: &ExtractArgs) -> anyhow::Result<ExtractionRequest> {
    if args.stdin {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        debug!("Read {} bytes from stdin", data.len());
        return ExtractionRequest::from_parts(Some(data), None)
            .map_err(|e| OcrProcessingError::from(e).into());
    }

    if let Some(request_path) = &args.request {
        let content = fs::read_to_string(request_path)?;
        let input: OcrInput = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Malformed request {}: {}", request_path.display(), e))?;
        return ExtractionRequest::try_from(input).map_err(|e| OcrProcessingError::from(e).into());
    }

    match &args.input {
        Some(path) => Ok(ExtractionRequest::Path(path.clone())),
        None => anyhow::bail!("No input given. Pass a file, --stdin or --request."),
    }
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(result.text()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)? + "\n"),
    }
}
