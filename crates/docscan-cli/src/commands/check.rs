//! Check command - verify that the OCR engine can be loaded.

use std::fs;
use std::path::Path;
use std::time::Instant;

use console::style;

use docscan_core::PureEngineFactory;
use docscan_core::RecognizerFactory;

use super::load_config;
use crate::GlobalArgs;

pub async fn run(global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let ocr = &config.ocr;

    println!("{}", style("Engine Status").bold());
    println!("Profile:        {}", style(ocr.profile()).cyan().bold());
    println!("Data directory: {}", ocr.data_dir.display());
    println!("Page workers:   {}", config.pipeline.max_workers);
    println!();

    let files = [
        ("detection model", ocr.detection_model_path()),
        ("recognition model", ocr.recognition_model_path()),
        ("dictionary", ocr.dictionary_path()),
    ];
    for (what, path) in &files {
        print_file_status(what, path)?;
    }
    println!();

    let factory = PureEngineFactory::new(ocr.clone());
    let start = Instant::now();
    let engine = tokio::task::spawn_blocking(move || factory.create()).await?;

    match engine {
        Ok(_) => {
            println!(
                "{} Engine loaded in {}ms",
                style("✓").green(),
                start.elapsed().as_millis()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} Engine could not be loaded", style("✗").red());
            Err(e.into())
        }
    }
}

fn print_file_status(what: &str, path: &Path) -> anyhow::Result<()> {
    let (status, size) = if path.is_file() {
        let size = fs::metadata(path)?.len();
        (style("✓").green(), format_size(size))
    } else {
        (style("✗").red(), "missing".to_string())
    };

    println!("    {} {:<18} {:>10}  {}", status, what, size, path.display());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(10 * 1024 * 1024 + 512 * 1024), "10.5 MB");
    }
}
