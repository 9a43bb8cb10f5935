//! 文字提取 trait 定义

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// 带位置的文字词
///
/// 坐标为像素坐标，`psm` 记录产生该结果的页面分割模式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
    pub psm: u8,
}

/// 文字提取能力
///
/// 全文提取用于找候选号码，版面提取用于定位遮盖区域。
/// 实现必须可在多个 worker 之间共享。
pub trait TextExtractor: Send + Sync {
    /// 全文提取
    fn extract_text(&self, image: &DynamicImage, psm: u8) -> Result<String, OcrError>;

    /// 版面提取，返回词级别的文字和边界框
    fn extract_regions(&self, image: &DynamicImage, psm: u8) -> Result<Vec<TextRegion>, OcrError>;
}
