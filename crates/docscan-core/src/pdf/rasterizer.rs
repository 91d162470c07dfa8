//! Page rasterization.
//!
//! lopdf checks the document structure and counts pages up front; each page
//! is then rendered in full (text, vector graphics and images) by the pure
//! Rust `hayro` renderer when the stream reaches it.

use std::sync::Arc;

use hayro::{InterpreterSettings, Pdf, RenderSettings};
use image::{DynamicImage, RgbImage};
use lopdf::Document;
use tracing::{debug, trace};

use super::{PageStream, PdfRasterizer, Result};
use crate::error::PdfError;

/// Longest side, in pixels, of a rendered page.
const MAX_PAGE_SIDE: f32 = 8192.0;

/// Renders PDF pages at a fixed resolution.
#[derive(Debug, Clone)]
pub struct HayroRasterizer {
    dpi: u32,
}

impl HayroRasterizer {
    /// Create a rasterizer rendering pages at `dpi`.
    pub fn new(dpi: u32) -> Self {
        Self { dpi: dpi.max(1) }
    }
}

impl Default for HayroRasterizer {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PdfRasterizer for HayroRasterizer {
    fn rasterize<'a>(&self, data: &'a [u8]) -> Result<PageStream<'a>> {
        let pages = RenderedPages::open(data, self.dpi)?;
        Ok(Box::new(pages))
    }
}

/// Lazy page iterator; a page is rendered only when requested.
pub struct RenderedPages {
    pdf: Option<Pdf>,
    next: usize,
    count: usize,
    dpi: u32,
}

impl RenderedPages {
    /// Open `data`. Documents locked with a non-empty password are refused.
    pub fn open(data: &[u8], dpi: u32) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("PDF is protected by an empty password");
        }

        let count = document.get_pages().len();
        debug!("Loaded PDF with {} pages", count);

        // Nothing to render, so the renderer is never loaded.
        let pdf = if count == 0 {
            None
        } else {
            let pdf = Pdf::new(Arc::new(data.to_vec()))
                .map_err(|e| PdfError::Parse(format!("{:?}", e)))?;
            Some(pdf)
        };

        Ok(Self {
            pdf,
            next: 0,
            count,
            dpi,
        })
    }

    /// Number of pages not yet rendered.
    pub fn remaining(&self) -> usize {
        self.count - self.next
    }

    fn render(&self, index: usize) -> Result<DynamicImage> {
        let page = self
            .pdf
            .as_ref()
            .and_then(|pdf| pdf.pages().get(index))
            .ok_or_else(|| PdfError::Render(format!("page {} is missing", index + 1)))?;

        let media_box = page.media_box();
        let width_pt = (media_box.x1 - media_box.x0) as f32;
        let height_pt = (media_box.y1 - media_box.y0) as f32;
        if width_pt <= 0.0 || height_pt <= 0.0 {
            return Err(PdfError::Render(format!(
                "page {} has an empty MediaBox",
                index + 1
            )));
        }

        let mut scale = self.dpi as f32 / 72.0;
        let longest = width_pt.max(height_pt) * scale;
        if longest > MAX_PAGE_SIDE {
            scale *= MAX_PAGE_SIDE / longest;
        }

        let settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &settings);
        let (width, height) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
        trace!("Rendered page {} at {}x{}", index + 1, width, height);

        let rgb = flatten_rgba(pixmap.data_as_u8_slice());
        RgbImage::from_raw(width, height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| {
                PdfError::Render(format!("page {} produced a short pixmap", index + 1))
            })
    }
}

impl Iterator for RenderedPages {
    type Item = Result<DynamicImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.render(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// Composite premultiplied RGBA over white and drop the alpha channel.
fn flatten_rgba(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let paper = 255 - px[3];
        rgb.extend(px[..3].iter().map(|c| c.saturating_add(paper)));
    }
    rgb
}
