//! Input format resolution.
//!
//! A path declares its format through the file extension. Raw bytes carry
//! no declaration: they are opened as a PDF first and, if that fails, the
//! same buffer is decoded as a raster image.

use std::path::Path;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DecodeError, ExtractionError};
use crate::models::request::ExtractionRequest;
use crate::pdf::{PageStream, PdfRasterizer};

/// Input formats known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedFormat {
    Pdf,
    RasterImage,
    Unsupported,
}

impl SupportedFormat {
    /// Map a file extension (without the dot), case-insensitively.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => SupportedFormat::Pdf,
            "png" | "jpg" | "jpeg" | "bmp" | "gif" => SupportedFormat::RasterImage,
            _ => SupportedFormat::Unsupported,
        }
    }

    /// Format declared by a path's extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(SupportedFormat::Unsupported)
    }
}

/// Trait for raster image decoders.
pub trait RasterDecoder: Send + Sync {
    /// Decode a complete image file held in memory.
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, image::ImageError>;
}

/// Decoder for the accepted raster formats, built on the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl RasterDecoder for ImageDecoder {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, image::ImageError> {
        let format = image::guess_format(data)?;
        match format {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Gif => {
                image::load_from_memory_with_format(data, format)
            }
            other => Err(image::ImageError::Unsupported(
                image::error::UnsupportedError::from_format_and_kind(
                    other.into(),
                    image::error::UnsupportedErrorKind::Format(other.into()),
                ),
            )),
        }
    }
}

/// Outcome of resolving a request: what to run recognition on.
pub enum Resolution<'a> {
    /// A PDF, as a lazy stream of page images.
    Pdf(PageStream<'a>),
    /// A single decoded raster image.
    Image(DynamicImage),
}

impl Resolution<'_> {
    /// Format this resolution was decided as.
    pub fn format(&self) -> SupportedFormat {
        match self {
            Resolution::Pdf(_) => SupportedFormat::Pdf,
            Resolution::Image(_) => SupportedFormat::RasterImage,
        }
    }
}

/// Decides how a request is interpreted.
pub struct FormatResolver {
    rasterizer: Box<dyn PdfRasterizer>,
    decoder: Box<dyn RasterDecoder>,
}

impl FormatResolver {
    /// Create a resolver from a PDF rasterizer and an image decoder.
    pub fn new(rasterizer: Box<dyn PdfRasterizer>, decoder: Box<dyn RasterDecoder>) -> Self {
        Self {
            rasterizer,
            decoder,
        }
    }

    /// Load the bytes to resolve for `request`.
    ///
    /// Path requests are checked for existence and extension before the file
    /// is read, so unsupported files are never opened.
    pub fn load(&self, request: ExtractionRequest) -> Result<Input, ExtractionError> {
        match request {
            ExtractionRequest::Bytes(data) => Ok(Input {
                declared: None,
                data,
            }),
            ExtractionRequest::Path(path) => {
                if !path.is_file() {
                    return Err(ExtractionError::NotFound(path));
                }

                let declared = match SupportedFormat::from_path(&path) {
                    SupportedFormat::Pdf => Declared::Pdf,
                    SupportedFormat::RasterImage => Declared::Image,
                    SupportedFormat::Unsupported => {
                        let extension = path
                            .extension()
                            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                            .unwrap_or_default();
                        return Err(ExtractionError::UnsupportedFormat(extension));
                    }
                };

                debug!("Reading {} as {:?}", path.display(), declared);
                let data = std::fs::read(&path)?;
                Ok(Input {
                    declared: Some(declared),
                    data,
                })
            }
        }
    }

    /// Turn loaded input into something recognizable.
    pub fn resolve<'a>(&self, input: &'a Input) -> Result<Resolution<'a>, ExtractionError> {
        let data = input.data.as_slice();
        match input.declared {
            Some(Declared::Pdf) => self
                .rasterizer
                .rasterize(data)
                .map(Resolution::Pdf)
                .map_err(|e| DecodeError::Pdf(e).into()),
            Some(Declared::Image) => self
                .decoder
                .decode(data)
                .map(Resolution::Image)
                .map_err(|e| DecodeError::Image(e).into()),
            None => self.sniff(data),
        }
    }

    /// PDF first, then raster image, over the same buffer.
    fn sniff<'a>(&self, data: &'a [u8]) -> Result<Resolution<'a>, ExtractionError> {
        let pdf_err = match self.rasterizer.rasterize(data) {
            Ok(pages) => {
                debug!("Input resolved as PDF");
                return Ok(Resolution::Pdf(pages));
            }
            Err(e) => e,
        };

        debug!("Not a PDF ({}), trying raster image", pdf_err);
        match self.decoder.decode(data) {
            Ok(image) => {
                debug!("Input resolved as raster image");
                Ok(Resolution::Image(image))
            }
            Err(image_err) => Err(DecodeError::Unrecognized {
                pdf: pdf_err,
                image: image_err,
            }
            .into()),
        }
    }
}

/// A format a path can declare; unsupported paths never get this far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Pdf,
    Image,
}

/// Fully buffered input plus the format its path declared, if any.
#[derive(Debug)]
pub struct Input {
    declared: Option<Declared>,
    data: Vec<u8>,
}

impl Input {
    /// Format declared by the request, `None` for raw bytes.
    pub fn declared(&self) -> Option<SupportedFormat> {
        self.declared.map(|declared| match declared {
            Declared::Pdf => SupportedFormat::Pdf,
            Declared::Image => SupportedFormat::RasterImage,
        })
    }

    /// The buffered content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PdfError};
    use crate::testing::{png_bytes, shaded_pdf};
    use crate::pdf::HayroRasterizer;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    struct FailingRasterizer(CallLog);

    impl PdfRasterizer for FailingRasterizer {
        fn rasterize<'a>(&self, _data: &'a [u8]) -> crate::pdf::Result<PageStream<'a>> {
            self.0.lock().unwrap().push("pdf");
            Err(PdfError::Parse("not a pdf".into()))
        }
    }

    struct LoggingDecoder(CallLog);

    impl RasterDecoder for LoggingDecoder {
        fn decode(&self, data: &[u8]) -> Result<DynamicImage, image::ImageError> {
            self.0.lock().unwrap().push("image");
            ImageDecoder.decode(data)
        }
    }

    fn real_resolver() -> FormatResolver {
        FormatResolver::new(Box::new(HayroRasterizer::default()), Box::new(ImageDecoder))
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(SupportedFormat::from_extension("PDF"), SupportedFormat::Pdf);
        for ext in ["png", "JPG", "jpeg", "bmp", "Gif"] {
            assert_eq!(SupportedFormat::from_extension(ext), SupportedFormat::RasterImage);
        }
        for ext in ["txt", "tiff", "webp", ""] {
            assert_eq!(SupportedFormat::from_extension(ext), SupportedFormat::Unsupported);
        }
        assert_eq!(
            SupportedFormat::from_path(Path::new("noext")),
            SupportedFormat::Unsupported
        );
    }

    #[test]
    fn test_bytes_try_pdf_before_image() {
        let log: CallLog = Arc::default();
        let resolver = FormatResolver::new(
            Box::new(FailingRasterizer(log.clone())),
            Box::new(LoggingDecoder(log.clone())),
        );

        let input = resolver.load(ExtractionRequest::Bytes(b"garbage".to_vec())).unwrap();
        let err = resolver.resolve(&input).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(matches!(err, ExtractionError::Decode(DecodeError::Unrecognized { .. })));
        assert_eq!(*log.lock().unwrap(), vec!["pdf", "image"]);
    }

    #[test]
    fn test_bytes_fall_back_to_image() {
        let resolver = real_resolver();
        let input = resolver.load(ExtractionRequest::Bytes(png_bytes(42))).unwrap();
        let resolution = resolver.resolve(&input).unwrap();
        assert_eq!(resolution.format(), SupportedFormat::RasterImage);
    }

    #[test]
    fn test_bytes_detected_as_pdf() {
        let resolver = real_resolver();
        let input = resolver.load(ExtractionRequest::Bytes(shaded_pdf(&[1]))).unwrap();
        assert_eq!(resolver.resolve(&input).unwrap().format(), SupportedFormat::Pdf);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let err = real_resolver()
            .load(ExtractionRequest::Path(PathBuf::from("/nonexistent/scan.pdf")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unsupported_extension_rejected_before_reading() {
        let log: CallLog = Arc::default();
        let resolver = FormatResolver::new(
            Box::new(FailingRasterizer(log.clone())),
            Box::new(LoggingDecoder(log.clone())),
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.TXT");
        std::fs::write(&path, b"hello").unwrap();

        let err = resolver.load(ExtractionRequest::Path(path)).unwrap_err();

        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref ext) if ext == ".txt"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_declared_pdf_does_not_fall_back() {
        let log: CallLog = Arc::default();
        let resolver = FormatResolver::new(
            Box::new(FailingRasterizer(log.clone())),
            Box::new(LoggingDecoder(log.clone())),
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, png_bytes(7)).unwrap();

        let input = resolver.load(ExtractionRequest::Path(path)).unwrap();
        let err = resolver.resolve(&input).err().unwrap();

        assert!(matches!(err, ExtractionError::Decode(DecodeError::Pdf(_))));
        assert_eq!(*log.lock().unwrap(), vec!["pdf"]);
    }

    #[test]
    fn test_path_declares_format() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = real_resolver();

        let image_path = dir.path().join("scan.JPEG");
        std::fs::write(&image_path, png_bytes(1)).unwrap();
        let input = resolver.load(ExtractionRequest::Path(image_path)).unwrap();
        assert_eq!(input.declared(), Some(SupportedFormat::RasterImage));

        let input = resolver.load(ExtractionRequest::Bytes(png_bytes(1))).unwrap();
        assert_eq!(input.declared(), None);
    }
}
