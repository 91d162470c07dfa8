//! Error types for the docscan-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Outward-facing error returned by every extraction call.
///
/// The message is deliberately uniform; the underlying failure is kept as
/// the error source for diagnostics and can be inspected with
/// [`OcrProcessingError::cause`] or [`OcrProcessingError::kind`].
#[derive(Error, Debug)]
#[error("an unexpected error occurred during OCR processing")]
pub struct OcrProcessingError {
    #[source]
    cause: ExtractionError,
}

impl OcrProcessingError {
    /// The failure that aborted the extraction.
    pub fn cause(&self) -> &ExtractionError {
        &self.cause
    }

    /// Classification of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// Unwrap into the underlying failure.
    pub fn into_cause(self) -> ExtractionError {
        self.cause
    }
}

impl From<ExtractionError> for OcrProcessingError {
    fn from(cause: ExtractionError) -> Self {
        Self { cause }
    }
}

/// Coarse classification of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    UnsupportedFormat,
    Decode,
    Engine,
    Recognition,
    Io,
}

/// Internal failure taxonomy of the extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Neither or both inputs were provided.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not in the accepted list.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The input could not be interpreted as the attempted format.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The recognition engine could not be initialized.
    #[error("OCR engine unavailable: {0}")]
    Engine(#[source] OcrError),

    /// Recognition failed for a decoded image.
    #[error("{}", recognition_message(.page))]
    Recognition {
        /// Page index (0-based) for PDF input, `None` for a plain image.
        page: Option<usize>,
        #[source]
        source: OcrError,
    },

    /// Reading an existing input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn recognition_message(page: &Option<usize>) -> String {
    match page {
        Some(index) => format!("recognition failed on page {}", index + 1),
        None => "recognition failed".to_string(),
    }
}

impl ExtractionError {
    /// Classify an OCR failure: model loading problems are engine errors,
    /// everything else belongs to the image being recognized.
    pub fn from_ocr(page: Option<usize>, err: OcrError) -> Self {
        match err {
            OcrError::ModelLoad(_) => ExtractionError::Engine(err),
            other => ExtractionError::Recognition {
                page,
                source: other,
            },
        }
    }

    /// Classification used by callers that only need the error family.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ExtractionError::NotFound(_) => ErrorKind::NotFound,
            ExtractionError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ExtractionError::Decode(_) => ErrorKind::Decode,
            ExtractionError::Engine(_) => ErrorKind::Engine,
            ExtractionError::Recognition { .. } => ErrorKind::Recognition,
            ExtractionError::Io(_) => ErrorKind::Io,
        }
    }

    /// Page index of a per-page failure, if any.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            ExtractionError::Recognition { page, .. } => *page,
            ExtractionError::Decode(DecodeError::Page { index, .. }) => Some(*index),
            _ => None,
        }
    }
}

/// Errors raised while interpreting input bytes.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Declared PDF could not be opened.
    #[error("not a readable PDF: {0}")]
    Pdf(#[source] PdfError),

    /// Declared image could not be decoded.
    #[error("not a readable image: {0}")]
    Image(#[source] image::ImageError),

    /// Undeclared bytes failed both the PDF and the image attempt.
    #[error("input is neither a PDF ({pdf}) nor a supported image ({image})")]
    Unrecognized {
        pdf: PdfError,
        #[source]
        image: image::ImageError,
    },

    /// A page failed to rasterize after the document was opened.
    #[error("failed to rasterize page {}: {source}", .index + 1)]
    Page {
        index: usize,
        #[source]
        source: PdfError,
    },
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// A page could not be turned into an image.
    #[error("failed to render page: {0}")]
    Render(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models or language data.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the docscan library.
pub type Result<T> = std::result::Result<T, OcrProcessingError>;
