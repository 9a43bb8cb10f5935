//! 号码遮盖

use image::{DynamicImage, Rgb};
use std::path::Path;
use std::sync::Arc;

use uid_ocr::TextExtractor;
use uid_render::{paint_rect, PageImage, PixelRect};
use uid_rules::{token_matches, Identifier};

use crate::Result;

/// 按版面提取结果在图片上遮盖号码
pub struct RedactionEngine {
    extractor: Arc<dyn TextExtractor>,
    psm: Vec<u8>,
    color: Rgb<u8>,
    pdf_dpi: u32,
}

impl RedactionEngine {
    pub fn new(extractor: Arc<dyn TextExtractor>, psm: Vec<u8>, color: Rgb<u8>, pdf_dpi: u32) -> Self {
        Self { extractor, psm, color, pdf_dpi }
    }

    /// 原地遮盖，返回涂黑的区域数
    ///
    /// 每个 PSM 都在当前图像上重新做版面提取，后一轮能看到前一轮的遮盖。
    /// 重复调用不改变像素，但计数会再次累加。
    pub fn mask(&self, image: &mut PageImage, identifiers: &[Identifier]) -> usize {
        if identifiers.is_empty() {
            return 0;
        }

        let mut masked = 0;
        for &psm in &self.psm {
            let current = DynamicImage::ImageRgb8(image.clone());
            let regions = match self.extractor.extract_regions(&current, psm) {
                Ok(regions) => regions,
                Err(e) => {
                    log::warn!("[Redact] 版面提取失败 (psm {}): {}", psm, e);
                    continue;
                }
            };

            for region in regions.iter().filter(|r| token_matches(&r.text, identifiers)) {
                let rect = PixelRect::new(region.left, region.top, region.width, region.height);
                if paint_rect(image, rect, self.color) {
                    masked += 1;
                    log::debug!(
                        "[Redact] 遮盖 (psm {}): ({}, {}, {}, {})",
                        psm,
                        rect.left,
                        rect.top,
                        rect.width,
                        rect.height
                    );
                }
            }
        }

        log::info!("[Redact] 遮盖 {} 处，号码 {} 个", masked, identifiers.len());
        masked
    }

    /// 写出遮盖后的图像
    ///
    /// `.pdf` 目标包装成单页 PDF，其他扩展名按对应图片格式写出。
    pub fn write_masked(&self, image: &PageImage, dest: &Path) -> Result<()> {
        if has_pdf_extension(dest) {
            uid_pdf::write_images_as_pdf(&[DynamicImage::ImageRgb8(image.clone())], dest, self.pdf_dpi)?;
        } else {
            image.save(dest)?;
        }
        log::info!("[Redact] 输出: {}", dest.display());
        Ok(())
    }

    pub fn pdf_dpi(&self) -> u32 {
        self.pdf_dpi
    }
}

pub(crate) fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uid_ocr::{OcrError, TextRegion};

    struct FixedLayout(Vec<TextRegion>);

    impl TextExtractor for FixedLayout {
        fn extract_text(&self, _image: &DynamicImage, _psm: u8) -> std::result::Result<String, OcrError> {
            Ok(String::new())
        }

        fn extract_regions(&self, _image: &DynamicImage, psm: u8) -> std::result::Result<Vec<TextRegion>, OcrError> {
            Ok(self.0.iter().cloned().map(|r| TextRegion { psm, ..r }).collect())
        }
    }

    fn word(text: &str, left: i32) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            left,
            top: 10,
            width: 20,
            height: 8,
            confidence: 0.9,
            psm: 0,
        }
    }

    fn engine() -> RedactionEngine {
        let layout = FixedLayout(vec![word("2341", 5), word("DOB", 30), word("2346", 55)]);
        RedactionEngine::new(Arc::new(layout), vec![6], Rgb([0, 0, 0]), 120)
    }

    #[test]
    fn test_mask_is_visually_idempotent() {
        let ids = vec![Identifier::parse("234123412346").unwrap()];
        let mut img = PageImage::from_pixel(100, 40, Rgb([255, 255, 255]));
        let engine = engine();

        assert_eq!(engine.mask(&mut img, &ids), 2);
        assert_eq!(*img.get_pixel(10, 12), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(35, 12), Rgb([255, 255, 255]));
        let once = img.clone();

        // 计数不幂等
        assert_eq!(engine.mask(&mut img, &ids), 2);
        assert_eq!(img, once);
    }

    #[test]
    fn test_mask_without_identifiers_is_noop() {
        let mut img = PageImage::from_pixel(100, 40, Rgb([255, 255, 255]));
        let before = img.clone();
        assert_eq!(engine().mask(&mut img, &[]), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn test_write_masked_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = PageImage::from_pixel(24, 12, Rgb([255, 255, 255]));
        let engine = engine();

        let png = dir.path().join("card_masked.png");
        engine.write_masked(&img, &png).unwrap();
        assert_eq!(image::open(&png).unwrap().to_rgb8(), img);

        let pdf = dir.path().join("card_masked.PDF");
        engine.write_masked(&img, &pdf).unwrap();
        let head = std::fs::read(&pdf).unwrap();
        assert!(head.starts_with(b"%PDF-"));
    }
}
