//! 视觉复核
//!
//! 文字遮盖之后再跑一次检测器，把检测到的号码区域直接涂黑写回磁盘。

use image::Rgb;
use std::path::Path;
use std::sync::Arc;

use uid_render::{paint_rect, PixelRect};

use crate::detector::ObjectDetector;
use crate::error::Result;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

pub struct VisualCrossChecker {
    detector: Arc<dyn ObjectDetector>,
}

impl VisualCrossChecker {
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self { detector }
    }

    /// 复核已遮盖的图片文件
    ///
    /// 检测到号码区域时在文件上涂黑并返回 `false`，没有检测到返回 `true`。
    /// 对已经是黑色的区域重复涂黑不改变结果。
    pub fn confirm(&self, image_path: &Path) -> Result<bool> {
        let boxes = self.detector.detect(image_path)?;
        let rects: Vec<PixelRect> = boxes
            .iter()
            .filter(|b| b.label.is_identifier())
            .filter_map(|b| PixelRect::from_corners(b.x1, b.y1, b.x2, b.y2))
            .collect();

        let found = boxes.iter().any(|b| b.label.is_identifier());
        if !found {
            log::info!("[Verify] 未检测到号码区域: {}", image_path.display());
            return Ok(true);
        }

        let mut image = image::open(image_path)?.to_rgb8();
        let painted = rects
            .into_iter()
            .filter(|rect| paint_rect(&mut image, *rect, BLACK))
            .count();
        image.save(image_path)?;

        log::info!(
            "[Verify] 检测到号码区域，已涂黑 {} 处: {}",
            painted,
            image_path.display()
        );
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{DetectionBox, DetectionLabel};
    use uid_render::PageImage;

    struct FixedDetector(Vec<DetectionBox>);

    impl ObjectDetector for FixedDetector {
        fn detect(&self, _image_path: &Path) -> Result<Vec<DetectionBox>> {
            Ok(self.0.clone())
        }
    }

    fn region(label: DetectionLabel) -> DetectionBox {
        DetectionBox { label, x1: 2.0, y1: 2.0, x2: 6.0, y2: 5.0 }
    }

    fn white_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("page.png");
        PageImage::from_pixel(10, 10, Rgb([255, 255, 255])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_confirm_paints_identifier_regions() {
        let dir = tempfile::tempdir().unwrap();
        let path = white_png(dir.path());
        let checker = VisualCrossChecker::new(Arc::new(FixedDetector(vec![region(
            DetectionLabel::IdentifierRegion,
        )])));

        assert!(!checker.confirm(&path).unwrap());
        let painted = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*painted.get_pixel(3, 3), BLACK);
        assert_eq!(*painted.get_pixel(8, 8), Rgb([255, 255, 255]));

        // 再次复核结果不变
        assert!(!checker.confirm(&path).unwrap());
        assert_eq!(image::open(&path).unwrap().to_rgb8(), painted);
    }

    #[test]
    fn test_confirm_ignores_other_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = white_png(dir.path());
        let checker = VisualCrossChecker::new(Arc::new(FixedDetector(vec![region(
            DetectionLabel::Other("FACE".to_string()),
        )])));

        assert!(checker.confirm(&path).unwrap());
        let untouched = image::open(&path).unwrap().to_rgb8();
        assert!(untouched.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }
}
