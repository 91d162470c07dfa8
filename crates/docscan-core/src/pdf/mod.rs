//! PDF rasterization module.

mod rasterizer;

pub use rasterizer::{HayroRasterizer, RenderedPages};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Lazily produced page images, in document order.
///
/// Single use: pages are rendered one at a time as the stream is advanced.
pub type PageStream<'a> = Box<dyn Iterator<Item = Result<DynamicImage>> + 'a>;

/// Trait for PDF rasterization implementations.
pub trait PdfRasterizer: Send + Sync {
    /// Open a PDF and return its pages as a lazy image stream.
    ///
    /// Fails without yielding anything when `data` is not a readable PDF.
    fn rasterize<'a>(&self, data: &'a [u8]) -> Result<PageStream<'a>>;
}
