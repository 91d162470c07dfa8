//! CLI application for extracting text from scanned PDFs and images.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, check, config, extract};

/// docscan - Extract text from scanned PDFs and images with OCR
#[derive(Parser)]
#[command(name = "docscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that loads configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Engine data directory (overrides ocr.data_dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Comma-separated recognition languages (overrides ocr.languages)
    #[arg(long, global = true, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single document
    Extract(extract::ExtractArgs),

    /// Extract text from multiple documents
    Batch(batch::BatchArgs),

    /// Check that the OCR engine can be loaded
    Check,

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Extract(args) => extract::run(args, &cli.global).await,
        Commands::Batch(args) => batch::run(args, &cli.global).await,
        Commands::Check => check::run(&cli.global).await,
        Commands::Config(args) => config::run(args, cli.global.config.as_deref()).await,
    }
}
