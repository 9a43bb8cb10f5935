//! 图片组装为 PDF
//!
//! 每页一个 JPEG 图像对象铺满页面，原有文字层不会保留。

use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use std::path::Path;

use crate::error::{PdfError, Result};

/// 按切片顺序把图片写成多页 PDF
///
/// 页面尺寸 = 像素 × 72 / dpi（单位 pt）。
pub fn write_images_as_pdf(pages: &[DynamicImage], dest: &Path, dpi: u32) -> Result<()> {
    if pages.is_empty() {
        return Err(PdfError::Empty);
    }
    let dpi = dpi.max(1) as f32;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let rgb = page.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut jpeg = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let width_pt = width as f32 * 72.0 / dpi;
        let height_pt = height as f32 * 72.0 / dpi;

        // 把单位图像缩放到整页
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width_pt),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(height_pt),
                        Object::Real(0.0),
                        Object::Real(0.0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(Object::Reference(page_id));
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
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(dest)?;
    log::info!("[Pdf] 写入 {} 页: {}", count, dest.display());
    Ok(())
}
