//! CLI command implementations.

pub mod batch;
pub mod check;
pub mod config;
pub mod extract;

use tracing::debug;

use docscan_core::DocscanConfig;

use crate::GlobalArgs;

/// Load the configuration for a run and apply command-line overrides.
///
/// An explicit `--config` must exist; the per-user file is optional.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<DocscanConfig> {
    let mut config = match &global.config {
        Some(path) => DocscanConfig::from_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config {}: {}", path.display(), e)
        })?,
        None => {
            let path = config::default_config_path();
            if path.exists() {
                debug!("Using config from {}", path.display());
                DocscanConfig::from_file(&path)?
            } else {
                DocscanConfig::default()
            }
        }
    };

    if let Some(data_dir) = &global.data_dir {
        config.ocr.data_dir = data_dir.clone();
    }
    if let Some(languages) = &global.languages {
        config.ocr.languages = languages.iter().map(|l| l.trim().to_string()).collect();
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    Ok(config)
}
