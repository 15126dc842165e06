//! PDF writer for laid-out report pages.

use image::RgbImage;
use log::warn;
use lopdf::{dictionary, Document as PdfDocument, Object, ObjectId, Stream};

use super::document::Document;
use super::layout::{layout, FontFace, LayoutOp, Page, PageGeometry};
use crate::charts::drawable::Color;
use crate::error::AssemblyError;

fn font_resource(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "F1",
        FontFace::Bold => "F2",
        FontFace::Mono => "F3",
    }
}

/// Decodes every embedded chart image. Images that fail to decode are
/// logged and rendered as text instead.
fn decode_images(document: &Document) -> Vec<Option<RgbImage>> {
    document
        .images()
        .map(|captured| {
            let decoded = captured
                .png_bytes()
                .map_err(|e| e.to_string())
                .and_then(|png| image::load_from_memory(&png).map_err(|e| e.to_string()));
            match decoded {
                Ok(image) => Some(image.to_rgb8()),
                Err(e) => {
                    warn!("Dropping image for chart '{}': {}", captured.chart_id, e);
                    None
                }
            }
        })
        .collect()
}

/// Renders the document into PDF bytes.
pub fn render_pdf(document: &Document) -> Result<Vec<u8>, AssemblyError> {
    let geometry = PageGeometry::default();
    let images = decode_images(document);
    let dims: Vec<Option<(u32, u32)>> = images
        .iter()
        .map(|image| image.as_ref().map(|i| i.dimensions()))
        .collect();
    let pages = layout(document, &dims, &geometry);

    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let mono_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut xobjects = lopdf::Dictionary::new();
    for (index, image) in images.into_iter().enumerate() {
        let Some(image) = image else {
            continue;
        };
        let (width, height) = image.dimensions();
        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            image.into_raw(),
        );
        let image_id = doc.add_object(image_stream);
        xobjects.set(image_name(index), image_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
            "F3" => mono_id,
        },
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = page_content(page, &geometry);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (geometry.width as i64).into(),
                (geometry.height as i64).into(),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

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
    let info_id = info_dictionary(&mut doc, document);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AssemblyError::Render(e.to_string()))?;

    Ok(buffer)
}

fn info_dictionary(doc: &mut PdfDocument, document: &Document) -> ObjectId {
    doc.add_object(dictionary! {
        // lopdf escapes literal strings itself when saving.
        "Title" => Object::string_literal(document.title.as_str()),
        "Subject" => Object::string_literal(format!("Analysis {}", document.analysis_id)),
        "Producer" => Object::string_literal("vidinsight"),
    })
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn color_op(color: Color, operator: &str) -> String {
    format!(
        "{:.3} {:.3} {:.3} {}\n",
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        operator
    )
}

/// Builds one page's content stream, flipping layout coordinates into PDF
/// space (origin bottom-left).
fn page_content(page: &Page, geometry: &PageGeometry) -> String {
    let mut content = String::new();
    let flip = |y: f32| geometry.height - y;

    for op in &page.ops {
        match op {
            LayoutOp::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                content.push_str(&color_op(*color, "rg"));
                content.push_str(&format!(
                    "{:.2} {:.2} {:.2} {:.2} re f\n",
                    x,
                    flip(y + height),
                    width,
                    height
                ));
            }
            LayoutOp::Text {
                x,
                y,
                size,
                face,
                color,
                text,
            } => {
                content.push_str("BT\n");
                content.push_str(&format!("/{} {} Tf\n", font_resource(*face), size));
                content.push_str(&color_op(*color, "rg"));
                content.push_str(&format!("{:.2} {:.2} Td\n", x, flip(*y)));
                content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
                content.push_str("ET\n");
            }
            LayoutOp::Image {
                index,
                x,
                y,
                width,
                height,
            } => {
                content.push_str(&format!(
                    "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{} Do\nQ\n",
                    width,
                    height,
                    x,
                    flip(y + height),
                    image_name(*index)
                ));
            }
        }
    }
    content
}

fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            c if c.is_ascii() && !c.is_control() => c.to_string(),
            _ => " ".to_string(),
        })
        .collect()
}
