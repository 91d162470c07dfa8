//! Core library for document text extraction.
//!
//! This crate provides:
//! - Format resolution for PDFs and raster images (paths or raw bytes)
//! - PDF rasterization with `hayro` (structure checks with `lopdf`)
//! - OCR recognition using `pure-onnx-ocr`, behind a bounded engine pool
//! - An extraction pipeline that fans pages out and joins them in order

pub mod error;
pub mod format;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use error::{ErrorKind, ExtractionError, OcrProcessingError, Result};
pub use format::{FormatResolver, SupportedFormat};
pub use models::config::DocscanConfig;
pub use models::request::{ExtractionRequest, OcrInput};
pub use models::result::{ExtractionResult, PAGE_SEPARATOR, RecognizedPage};
pub use ocr::{EnginePool, Recognizer, RecognizerFactory};
#[cfg(feature = "native")]
pub use ocr::PureEngineFactory;
pub use pipeline::{ExtractionPipeline, PipelineBuilder};
