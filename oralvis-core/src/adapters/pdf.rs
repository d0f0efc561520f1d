//! PDF report renderer (lopdf)
//!
//! Produces a single US Letter page: the title, one line per report field,
//! then the scan image scaled into a 500x400pt box with its aspect ratio
//! preserved. Text streams are left uncompressed.

use image::imageops::FilterType;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::domain::result::{Error, Result};
use crate::domain::ReportFields;
use crate::ports::DocumentRenderer;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 56.0;

const TITLE_SIZE: i64 = 20;
const BODY_SIZE: i64 = 12;
const LINE_HEIGHT: f32 = 20.0;

/// Box the image is fitted into, in points
pub const IMAGE_BOX: (f32, f32) = (500.0, 400.0);

/// Larger images are downsampled before embedding
const MAX_EMBED_PIXELS: (u32, u32) = (2000, 1600);

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReportRenderer;

impl PdfReportRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Scale (width, height) to fit inside (max_w, max_h), keeping the ratio
pub fn fit_within(width: f32, height: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_w / width).min(max_h / height);
    (width * scale, height * scale)
}

/// Literal string limited to Latin-1, which the standard fonts can show
fn pdf_text(s: &str) -> Object {
    let bytes = s
        .chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

fn render_error(e: lopdf::Error) -> Error {
    Error::Render(e.to_string())
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::image_unavailable(format!("image could not be decoded: {}", e)))?;
    let (max_w, max_h) = MAX_EMBED_PIXELS;
    if img.width() > max_w || img.height() > max_h {
        Ok(img.resize(max_w, max_h, FilterType::Triangle))
    } else {
        Ok(img)
    }
}

fn text_line(font: &str, size: i64, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new("Tj", vec![pdf_text(text)]),
        Operation::new("ET", vec![]),
    ]
}

impl DocumentRenderer for PdfReportRenderer {
    fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    fn render(&self, fields: &ReportFields, image: &[u8]) -> Result<Vec<u8>> {
        let rgb = decode_image(image)?.to_rgb8();
        let (px_w, px_h) = rgb.dimensions();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(i64::from(px_w)),
                "Height" => Object::Integer(i64::from(px_h)),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
            },
            rgb.into_raw(),
        ));

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
            "XObject" => dictionary! {
                "Im1" => image_id,
            },
        });

        let mut operations = Vec::new();
        let mut y = PAGE_HEIGHT - MARGIN - TITLE_SIZE as f32;
        operations.extend(text_line("F2", TITLE_SIZE, MARGIN, y, &fields.title));
        y -= LINE_HEIGHT * 2.0;

        for (label, value) in &fields.lines {
            operations.extend(text_line("F1", BODY_SIZE, MARGIN, y, &format!("{}: {}", label, value)));
            y -= LINE_HEIGHT;
        }

        let (box_w, box_h) = IMAGE_BOX;
        let (draw_w, draw_h) = fit_within(px_w as f32, px_h as f32, box_w, box_h);
        let box_top = y - LINE_HEIGHT;
        let x = (PAGE_WIDTH - box_w) / 2.0 + (box_w - draw_w) / 2.0;
        let img_y = box_top - box_h + (box_h - draw_h) / 2.0;

        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                Object::Real(draw_w),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(draw_h),
                Object::Real(x),
                Object::Real(img_y),
            ],
        ));
        operations.push(Operation::new("Do", vec!["Im1".into()]));
        operations.push(Operation::new("Q", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(render_error)?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => Object::Integer(1),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| Error::Render(format!("cannot serialize PDF: {}", e)))?;
        Ok(out)
    }
}
