//! OCR recognition: engine adapter and pooled engine handles.

#[cfg(feature = "native")]
mod engine;
mod pool;

#[cfg(feature = "native")]
pub use engine::{PureEngineFactory, PureOcrEngine};
pub use pool::{EnginePool, PooledEngine};

use image::DynamicImage;

use crate::error::OcrError;

/// Converts a raster image into text.
///
/// Implementations are configured once with the process-wide language
/// profile; a blank image yields an empty string, not an error.
pub trait Recognizer: Send {
    /// Recognize all text in `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Creates recognizers for an [`EnginePool`].
pub trait RecognizerFactory: Send + Sync {
    type Recognizer: Recognizer;

    /// Build a fresh recognizer. Failure means the engine cannot be
    /// initialized with the current configuration.
    fn create(&self) -> Result<Self::Recognizer, OcrError>;
}

impl<F, R> RecognizerFactory for F
where
    F: Fn() -> Result<R, OcrError> + Send + Sync,
    R: Recognizer,
{
    type Recognizer = R;

    fn create(&self) -> Result<R, OcrError> {
        self()
    }
}

/// A recognized text box with its coordinates and content.
#[derive(Debug, Clone)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Join boxes in reading order (top-to-bottom, left-to-right), one per line.
pub fn reading_order_text(mut boxes: Vec<TextBox>) -> String {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        // Group by approximate vertical position (within 20 pixels)
        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    boxes
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let boxes = vec![
            text_box(200.0, 105.0, "world"),
            text_box(10.0, 300.0, "footer"),
            text_box(10.0, 100.0, "hello"),
        ];

        assert_eq!(reading_order_text(boxes), "hello\nworld\nfooter");
    }

    #[test]
    fn test_no_boxes_is_empty_text() {
        assert_eq!(reading_order_text(Vec::new()), "");
    }
}
