//! 候选号码提取

use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;

use uid_ocr::TextExtractor;
use uid_render::{apply_contrast, ContrastMode, PageImage};
use uid_rules::{parse_candidates, CandidateSet};

/// 对一张图片做对比度变换后，按每个 PSM 跑一次全文提取并解析候选
///
/// 不做校验位检查。单个 PSM 提取失败只记警告，不影响其他 PSM。
pub struct CandidateExtractor {
    extractor: Arc<dyn TextExtractor>,
    psm: Vec<u8>,
}

impl CandidateExtractor {
    pub fn new(extractor: Arc<dyn TextExtractor>, psm: Vec<u8>) -> Self {
        Self { extractor, psm }
    }

    pub fn extract_candidates(&self, image: &PageImage, mode: ContrastMode) -> CandidateSet {
        let start = Instant::now();
        let contrasted = DynamicImage::ImageLuma8(apply_contrast(image, mode));
        let mut candidates = CandidateSet::new();

        for &psm in &self.psm {
            match self.extractor.extract_text(&contrasted, psm) {
                Ok(text) => {
                    for candidate in parse_candidates(&text) {
                        log::debug!("[OCR] 候选 (psm {}, {}): {} 位", psm, mode, candidate.len());
                        candidates.insert(&candidate);
                    }
                }
                Err(e) => {
                    log::warn!("[OCR] 全文提取失败 (psm {}, {}): {}", psm, mode, e);
                }
            }
        }

        log::debug!(
            "[OCR] {} 模式提取完成，候选 {} 个，耗时: {} ms",
            mode,
            candidates.len(),
            start.elapsed().as_millis()
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::Mutex;
    use uid_ocr::{OcrError, TextRegion};

    /// 按 PSM 返回固定文本，记录调用
    struct ScriptedExtractor {
        calls: Mutex<Vec<u8>>,
    }

    impl TextExtractor for ScriptedExtractor {
        fn extract_text(&self, _image: &DynamicImage, psm: u8) -> Result<String, OcrError> {
            self.calls.lock().unwrap().push(psm);
            match psm {
                3 => Ok("Government of India\n2341 2341 2346\n".to_string()),
                4 => Err(OcrError::Process("boom".to_string())),
                _ => Ok("2341 MALE 2341\n2346".to_string()),
            }
        }

        fn extract_regions(&self, _image: &DynamicImage, _psm: u8) -> Result<Vec<TextRegion>, OcrError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_extract_candidates_across_psm() {
        let fake = Arc::new(ScriptedExtractor { calls: Mutex::new(Vec::new()) });
        let extractor = CandidateExtractor::new(fake.clone(), vec![3, 4, 6]);
        let page = PageImage::from_pixel(40, 20, Rgb([255, 255, 255]));

        let candidates = extractor.extract_candidates(&page, ContrastMode::Binary);

        assert_eq!(*fake.calls.lock().unwrap(), vec![3, 4, 6]);
        // psm 3 的分组和整行结果、psm 6 跨行拼接的分组结果去重后只剩一个
        assert_eq!(candidates.iter().collect::<Vec<_>>(), vec!["234123412346"]);
    }

    #[test]
    fn test_extra_groups_suppress_grouped_candidate() {
        struct DatedCard;
        impl TextExtractor for DatedCard {
            fn extract_text(&self, _image: &DynamicImage, _psm: u8) -> Result<String, OcrError> {
                Ok("DOB 1990 2341 2341 2346 MALE".to_string())
            }
            fn extract_regions(&self, _image: &DynamicImage, _psm: u8) -> Result<Vec<TextRegion>, OcrError> {
                Ok(Vec::new())
            }
        }

        let extractor = CandidateExtractor::new(Arc::new(DatedCard), vec![6]);
        let page = PageImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        assert!(extractor.extract_candidates(&page, ContrastMode::Binary).is_empty());
    }

    #[test]
    fn test_extraction_failure_yields_nothing() {
        let fake = Arc::new(ScriptedExtractor { calls: Mutex::new(Vec::new()) });
        let extractor = CandidateExtractor::new(fake, vec![4]);
        let page = PageImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        assert!(extractor.extract_candidates(&page, ContrastMode::Truncate).is_empty());
    }
}
