//! 视觉目标检测器

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use crate::error::{Result, VerifyError};

/// 默认的号码区域标签
pub const DEFAULT_IDENTIFIER_LABEL: &str = "AADHAR_NUMBER";

/// 检测框标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionLabel {
    /// 号码区域
    IdentifierRegion,
    Other(String),
}

impl DetectionLabel {
    /// 按配置的标签名分类
    pub fn classify(raw: &str, identifier_label: &str) -> Self {
        if raw == identifier_label {
            DetectionLabel::IdentifierRegion
        } else {
            DetectionLabel::Other(raw.to_string())
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, DetectionLabel::IdentifierRegion)
    }
}

/// 检测框，像素坐标 (x1, y1) 左上，(x2, y2) 右下
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBox {
    pub label: DetectionLabel,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// 视觉检测能力
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image_path: &Path) -> Result<Vec<DetectionBox>>;
}

/// 外部检测程序配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    /// 检测程序路径，为空时不做视觉检测
    pub command: Option<String>,
    /// 附加参数，图片路径追加在最后
    pub args: Vec<String>,
}

/// 检测程序输出的一条记录
#[derive(Debug, Deserialize)]
struct RawDetection {
    label: String,
    #[serde(rename = "box")]
    bbox: [f32; 4],
}

/// 解析检测程序输出
///
/// 格式：`[{"label": "AADHAR_NUMBER", "box": [x1, y1, x2, y2]}, ...]`
pub fn parse_detections(raw: &str, identifier_label: &str) -> Result<Vec<DetectionBox>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<RawDetection> = serde_json::from_str(trimmed)?;
    Ok(items
        .into_iter()
        .map(|item| {
            let [x1, y1, x2, y2] = item.bbox;
            DetectionBox {
                label: DetectionLabel::classify(&item.label, identifier_label),
                x1,
                y1,
                x2,
                y2,
            }
        })
        .collect())
}

/// 通过外部程序运行检测模型
///
/// 程序从命令行参数接收图片路径，在 stdout 输出 JSON 数组。
pub struct CommandDetector {
    command: String,
    args: Vec<String>,
    identifier_label: String,
}

impl CommandDetector {
    pub fn new(command: impl Into<String>, args: Vec<String>, identifier_label: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args,
            identifier_label: identifier_label.into(),
        }
    }
}

impl ObjectDetector for CommandDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<DetectionBox>> {
        let start = Instant::now();
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(image_path)
            .output()
            .map_err(|e| VerifyError::Process(format!("{}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VerifyError::Process(format!(
                "退出码 {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let boxes = parse_detections(&String::from_utf8_lossy(&output.stdout), &self.identifier_label)?;
        log::info!(
            "[Verify] 检测完成，耗时: {} ms，检测框: {}",
            start.elapsed().as_millis(),
            boxes.len()
        );
        Ok(boxes)
    }
}

/// 未配置检测程序时使用，总是返回空结果
pub struct DisabledDetector;

impl ObjectDetector for DisabledDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<DetectionBox>> {
        log::warn!("[Verify] 未配置检测程序，跳过视觉检测: {}", image_path.display());
        Ok(Vec::new())
    }
}
