//! 倾斜校正
//!
//! Canny 边缘 + Hough 直线，取直线角度的中位数作为倾斜角。
//! 只处理小角度倾斜，方向（90° 倍数）由上层的旋转搜索处理。

use image::Rgb;
use imageproc::edges::canny;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions};

use crate::PageImage;

/// 倾斜检测参数
#[derive(Debug, Clone, Copy)]
pub struct SkewOptions {
    pub canny_low: f32,
    pub canny_high: f32,
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    /// 超过该角度（绝对值）不校正
    pub max_angle: f32,
}

impl Default for SkewOptions {
    fn default() -> Self {
        Self {
            canny_low: 100.0,
            canny_high: 100.0,
            vote_threshold: 100,
            suppression_radius: 8,
            max_angle: 45.0,
        }
    }
}

/// 估计倾斜角（度，顺时针为正）
///
/// 未检测到任何直线时返回 `None`。
pub fn estimate_skew(image: &PageImage, options: &SkewOptions) -> Option<f32> {
    let gray = image::imageops::grayscale(image);
    let edges = canny(&gray, options.canny_low, options.canny_high);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: options.vote_threshold,
            suppression_radius: options.suppression_radius,
        },
    );

    if lines.is_empty() {
        return None;
    }

    // Hough 给出的是法线角度 [0, 180)，直线方向 = 法线 - 90
    let mut angles: Vec<f32> = lines
        .iter()
        .map(|line| line.angle_in_degrees as f32 - 90.0)
        .collect();
    log::debug!("[Render] 检测到 {} 条直线", angles.len());

    Some(median(&mut angles))
}

/// 校正倾斜
///
/// 倾斜角在 (-max_angle, max_angle) 内且不为 0 时返回旋转后的图像，
/// 否则返回 `None`（包括没有检测到直线的情况）。
pub fn correct_skew(image: &PageImage, options: &SkewOptions) -> Option<PageImage> {
    let Some(angle) = estimate_skew(image, options) else {
        log::info!("[Render] 未检测到直线，跳过倾斜校正");
        return None;
    };

    if angle == 0.0 || angle.abs() >= options.max_angle {
        log::debug!("[Render] 倾斜角 {:.1}°，不校正", angle);
        return None;
    }

    log::info!("[Render] 校正倾斜角 {:.1}°", angle);
    // rotate_about_center 顺时针旋转，这里需要逆时针转回
    Some(rotate_about_center(
        image,
        -angle.to_radians(),
        Interpolation::Bilinear,
        Rgb([255, 255, 255]),
    ))
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn test_blank_image_has_no_lines() {
        let blank = PageImage::from_pixel(200, 120, Rgb([255, 255, 255]));
        assert_eq!(estimate_skew(&blank, &SkewOptions::default()), None);
        assert!(correct_skew(&blank, &SkewOptions::default()).is_none());
    }

    #[test]
    fn test_horizontal_bar_is_not_skewed() {
        let mut img = PageImage::from_pixel(400, 200, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(0, 95).of_size(400, 12), Rgb([0, 0, 0]));

        let angle = estimate_skew(&img, &SkewOptions::default()).unwrap();
        assert!(angle.abs() < 1.0, "angle = {}", angle);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
    }
}
