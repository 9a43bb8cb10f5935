//! 对比度变换
//!
//! 两种模式都先转灰度，再用 Otsu 自动选择阈值。

use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

use crate::PageImage;

/// 对比度模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContrastMode {
    /// 高于阈值的像素截断为阈值
    Truncate,
    /// 高于阈值为 255，否则为 0
    Binary,
}

impl ContrastMode {
    /// 提取时依次尝试的模式
    pub const ALL: [ContrastMode; 2] = [ContrastMode::Truncate, ContrastMode::Binary];

    pub fn index(self) -> u8 {
        match self {
            ContrastMode::Truncate => 0,
            ContrastMode::Binary => 1,
        }
    }
}

impl std::fmt::Display for ContrastMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContrastMode::Truncate => write!(f, "truncate"),
            ContrastMode::Binary => write!(f, "binary"),
        }
    }
}

/// 对页面图像应用对比度变换，返回灰度图
pub fn apply_contrast(image: &PageImage, mode: ContrastMode) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let level = otsu_level(&gray);
    log::debug!("[Render] Otsu 阈值: {} ({})", level, mode);

    let threshold_type = match mode {
        ContrastMode::Truncate => ThresholdType::Truncate,
        ContrastMode::Binary => ThresholdType::Binary,
    };
    threshold(&gray, level, threshold_type)
}
