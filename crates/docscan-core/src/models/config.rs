//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for docscan.
///
/// Read once at start-up and shared read-only by every extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocscanConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// PDF rasterization configuration.
    pub pdf: PdfConfig,

    /// Page-level concurrency.
    pub pipeline: PipelineConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition languages, active together as one combined profile.
    pub languages: Vec<String>,

    /// Directory holding detection and recognition model data.
    pub data_dir: PathBuf,

    /// Text detection model file name inside `data_dir`.
    pub detection_model: String,

    /// Keep `[UNK]` tokens emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: ["eng", "chi_sim", "chi_tra", "jpn"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            data_dir: PathBuf::from("./tessdata"),
            detection_model: "det.onnx".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Name of the combined language profile, e.g. `eng+chi_sim+chi_tra+jpn`.
    pub fn profile(&self) -> String {
        self.languages.join("+")
    }

    /// Path to the text detection model.
    pub fn detection_model_path(&self) -> PathBuf {
        self.data_dir.join(&self.detection_model)
    }

    /// Path to the recognition model of the combined profile.
    pub fn recognition_model_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.rec.onnx", self.profile()))
    }

    /// Path to the character dictionary of the combined profile.
    pub fn dictionary_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.dict.txt", self.profile()))
    }
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI used to size pages that carry no embedded scan.
    pub render_dpi: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { render_dpi: 300 }
    }
}

/// Concurrency settings for multi-page documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of pages recognized at the same time. Also bounds the
    /// number of engine instances kept in the pool.
    pub max_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

impl DocscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check the settings that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), String> {
        if self.ocr.languages.is_empty() {
            return Err("ocr.languages must name at least one language".to_string());
        }

        for (i, lang) in self.ocr.languages.iter().enumerate() {
            let well_formed = !lang.is_empty()
                && lang
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if !well_formed {
                return Err(format!("invalid language name: {:?}", lang));
            }
            if self.ocr.languages[..i].contains(lang) {
                return Err(format!("duplicate language: {}", lang));
            }
        }

        if self.pipeline.max_workers == 0 {
            return Err("pipeline.max_workers must be at least 1".to_string());
        }

        if self.pdf.render_dpi == 0 {
            return Err("pdf.render_dpi must be positive".to_string());
        }

        Ok(())
    }
}
