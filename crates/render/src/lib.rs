//! Raster operations for the redaction pipeline.

mod contrast;
mod skew;

pub use contrast::{apply_contrast, ContrastMode};
pub use skew::{correct_skew, estimate_skew, SkewOptions};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// 单页栅格图像，在旋转、对比度、遮盖过程中原地修改
pub type PageImage = RgbImage;

/// 像素坐标矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }

    /// 由左上、右下两个角点构造，坐标颠倒或面积为 0 时返回 `None`
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Self> {
        let (left, top) = (x1.floor() as i32, y1.floor() as i32);
        let (right, bottom) = (x2.ceil() as i32, y2.ceil() as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(left, top, (right - left) as u32, (bottom - top) as u32))
    }
}

/// 在图像上绘制实心矩形，超出边界的部分被裁剪
///
/// 返回是否绘制（面积为 0 的矩形不绘制）。
pub fn paint_rect(image: &mut PageImage, rect: PixelRect, color: Rgb<u8>) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let area = Rect::at(rect.left, rect.top).of_size(rect.width, rect.height);
    draw_filled_rect_mut(image, area, color);
    true
}

/// 逆时针旋转 90°
pub fn rotate_quarter_ccw(image: &PageImage) -> PageImage {
    image::imageops::rotate270(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> PageImage {
        PageImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]))
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        let original = gradient(37, 21);
        let mut img = original.clone();
        for _ in 0..4 {
            img = rotate_quarter_ccw(&img);
        }
        assert_eq!(img, original);
    }

    #[test]
    fn test_quarter_turn_is_counter_clockwise() {
        let mut img = PageImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        // 右上角标记
        img.put_pixel(2, 0, Rgb([0, 0, 0]));
        let rotated = rotate_quarter_ccw(&img);
        assert_eq!(rotated.dimensions(), (2, 3));
        // 逆时针后右上角到了左上角
        assert_eq!(*rotated.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_paint_rect_is_clipped_and_idempotent() {
        let mut img = PageImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let rect = PixelRect::new(7, 7, 10, 10);
        assert!(paint_rect(&mut img, rect, Rgb([0, 0, 0])));
        let once = img.clone();
        assert!(paint_rect(&mut img, rect, Rgb([0, 0, 0])));
        assert_eq!(img, once);
        assert_eq!(*img.get_pixel(9, 9), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(6, 6), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_paint_empty_rect() {
        let mut img = PageImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        assert!(!paint_rect(&mut img, PixelRect::new(1, 1, 0, 3), Rgb([0, 0, 0])));
    }

    #[test]
    fn test_rect_from_corners() {
        assert_eq!(
            PixelRect::from_corners(10.2, 5.0, 20.7, 9.0),
            Some(PixelRect::new(10, 5, 11, 4))
        );
        assert_eq!(PixelRect::from_corners(20.0, 5.0, 10.0, 9.0), None);
    }
}
