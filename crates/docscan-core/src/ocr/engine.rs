//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{Recognizer, RecognizerFactory, TextBox, reading_order_text};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// One instance is loaded with the combined language profile; all configured
/// languages are recognized in a single pass.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Load the detection model and the profile's recognition model and
    /// dictionary from `config.data_dir`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        if config.languages.is_empty() {
            return Err(OcrError::ModelLoad("no recognition languages configured".to_string()));
        }
        if !config.data_dir.is_dir() {
            return Err(OcrError::ModelLoad(format!(
                "engine data directory not found: {}",
                config.data_dir.display()
            )));
        }

        let det_path = config.detection_model_path();
        let rec_path = config.recognition_model_path();
        let dict_path = config.dictionary_path();

        require_file(&det_path, "detection model")?;
        require_file(&rec_path, &format!("recognition model for '{}'", config.profile()))?;
        require_file(&dict_path, &format!("language data for '{}'", config.profile()))?;

        let start = Instant::now();
        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded pure-onnx-ocr engine for {} from {} in {}ms",
            config.profile(),
            config.data_dir.display(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }

    /// Recognize text boxes in an image.
    pub fn detect_boxes(&self, image: &DynamicImage) -> Result<Vec<TextBox>, OcrError> {
        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        Ok(results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect())
    }
}

impl Recognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{} image", width, height)));
        }

        debug!("Recognizing image: {}x{}", width, height);
        let boxes = self.detect_boxes(image)?;
        let count = boxes.len();
        let text = reading_order_text(boxes);

        debug!(
            "OCR complete: {} text boxes in {}ms",
            count,
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Builds [`PureOcrEngine`]s from a fixed configuration.
#[derive(Debug, Clone)]
pub struct PureEngineFactory {
    config: OcrConfig,
}

impl PureEngineFactory {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }
}

impl RecognizerFactory for PureEngineFactory {
    type Recognizer = PureOcrEngine;

    fn create(&self) -> Result<PureOcrEngine, OcrError> {
        PureOcrEngine::from_config(&self.config)
    }
}

fn require_file(path: &Path, what: &str) -> Result<(), OcrError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(OcrError::ModelLoad(format!("missing {} at {}", what, path.display())))
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_data_dir_is_model_load_error() {
        let config = OcrConfig {
            data_dir: PathBuf::from("/nonexistent/ocr-data"),
            ..OcrConfig::default()
        };

        let err = PureOcrEngine::from_config(&config).err().unwrap();
        assert!(matches!(err, OcrError::ModelLoad(ref msg) if msg.contains("data directory")));
    }

    #[test]
    fn test_missing_language_data_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = OcrConfig {
            data_dir: dir.path().to_path_buf(),
            ..OcrConfig::default()
        };
        std::fs::write(config.detection_model_path(), b"").unwrap();

        let err = PureEngineFactory::new(config).create().err().unwrap();
        assert!(matches!(err, OcrError::ModelLoad(ref msg) if msg.contains("eng+chi_sim+chi_tra+jpn")));
    }
}
