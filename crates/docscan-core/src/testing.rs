//! In-memory fixtures shared by unit tests.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// A PDF with one 72x72pt page per shade; each page is covered by an 8x8
/// gray image filled with that shade.
pub fn shaded_pdf(shades: &[u8]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for &shade in shades {
        let image_id = doc.add_object(gray_image(8, 8, 8, vec![shade; 64]));
        let resources = dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        };
        let page_id = add_page(&mut doc, pages_id, (72.0, 72.0), resources, draw_image(72.0, 72.0));
        kids.push(page_id.into());
    }

    finish(doc, pages_id, kids)
}

/// A single empty page sized `width` x `height` points.
pub fn blank_pdf(width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = add_page(&mut doc, pages_id, (width, height), Dictionary::new(), Vec::new());

    finish(doc, pages_id, vec![page_id.into()])
}

/// A 200x100pt page drawn only with text and vector operators.
pub fn vector_text_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![10.into(), 30.into()]),
            Operation::new("Tj", vec![Object::string_literal("HELLO")]),
            Operation::new("ET", vec![]),
            Operation::new("w", vec![4.into()]),
            Operation::new("m", vec![0.into(), 0.into()]),
            Operation::new("l", vec![200.into(), 100.into()]),
            Operation::new("S", vec![]),
            Operation::new("re", vec![150.into(), 10.into(), 40.into(), 40.into()]),
            Operation::new("f", vec![]),
        ],
    };
    let content = content.encode().expect("content stream");
    let page_id = add_page(&mut doc, pages_id, (200.0, 100.0), resources, content);

    finish(doc, pages_id, vec![page_id.into()])
}

/// A 200x100pt page covered by a black 1-bit scan.
pub fn bilevel_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    // 16 pixels per row packs into 2 bytes; 0 is black.
    let image_id = doc.add_object(gray_image(16, 8, 1, vec![0u8; 16]));
    let resources = dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    };
    let page_id = add_page(&mut doc, pages_id, (200.0, 100.0), resources, draw_image(200.0, 100.0));

    finish(doc, pages_id, vec![page_id.into()])
}

/// A PNG-encoded 8x8 gray image.
pub fn png_bytes(shade: u8) -> Vec<u8> {
    let mut data = Vec::new();
    DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([shade])))
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .expect("in-memory PNG");
    data
}

/// Gray level at the middle of a rendered page.
pub fn center_shade(page: &DynamicImage) -> u8 {
    let gray = page.to_luma8();
    gray.get_pixel(gray.width() / 2, gray.height() / 2)[0]
}

fn gray_image(width: i64, height: i64, bits: i64, samples: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => bits,
        },
        samples,
    )
}

/// Content stream painting `Im0` over the whole page.
fn draw_image(width: f32, height: f32) -> Vec<u8> {
    format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", width, height).into_bytes()
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    (width, height): (f32, f32),
    resources: Dictionary,
    content: Vec<u8>,
) -> ObjectId {
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => resources,
        "Contents" => content_id,
    })
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>) -> Vec<u8> {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    doc.save_to(&mut data).expect("in-memory PDF");
    data
}
