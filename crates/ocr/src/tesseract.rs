//! Tesseract OCR 引擎实现（CLI 包装）

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::engine::{TextExtractor, TextRegion};
use crate::error::OcrError;

/// Tesseract 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TesseractConfig {
    /// Tesseract 可执行文件路径
    pub binary_path: Option<String>,
    /// tessdata 目录路径
    pub tessdata_path: Option<String>,
    /// 语言（如 "eng"）
    pub lang: Option<String>,
    /// OCR 引擎模式 (0-3)
    pub oem: Option<u8>,
}

impl TesseractConfig {
    pub fn binary_or_default(&self) -> &str {
        self.binary_path.as_deref().unwrap_or("tesseract")
    }

    pub fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or("eng")
    }

    pub fn oem_or_default(&self) -> u8 {
        self.oem.unwrap_or(3)
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy)]
enum OutputKind {
    Text,
    Tsv,
}

/// Tesseract OCR 引擎
///
/// 每次调用把图像写到工作目录下的唯一临时文件，再调用 CLI。
/// 不持有可变状态，可在 worker 之间共享。
pub struct TesseractEngine {
    config: TesseractConfig,
    version: String,
    work_dir: PathBuf,
}

impl TesseractEngine {
    /// 创建 Tesseract 引擎，会先检查可执行文件是否可用
    pub fn new(config: TesseractConfig) -> Result<Self, OcrError> {
        let version = get_tesseract_version(config.binary_or_default())?;
        log::info!("[Tesseract] 初始化成功，版本: {}", version);

        Ok(Self {
            config,
            version,
            work_dir: std::env::temp_dir(),
        })
    }

    /// 指定临时文件目录
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// 引擎参数（用于日志和 check 命令）
    pub fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "binary": self.config.binary_or_default(),
            "version": self.version,
            "lang": self.config.lang_or_default(),
            "oem": self.config.oem_or_default(),
            "tessdata": self.config.tessdata_path,
        })
    }

    fn run(&self, image: &DynamicImage, psm: u8, kind: OutputKind) -> Result<String, OcrError> {
        std::fs::create_dir_all(&self.work_dir)?;
        let temp_input = TempImage::new(&self.work_dir);

        image
            .save(temp_input.path())
            .map_err(|e| OcrError::ImageProcess(format!("保存临时图片失败: {}", e)))?;

        let mut cmd = Command::new(self.config.binary_or_default());
        cmd.arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(self.config.lang_or_default())
            .arg("--oem")
            .arg(self.config.oem_or_default().to_string())
            .arg("--psm")
            .arg(psm.to_string());
        if let OutputKind::Tsv = kind {
            cmd.arg("tsv");
        }

        // 设置 tessdata 路径
        if let Some(tessdata_path) = &self.config.tessdata_path {
            cmd.env("TESSDATA_PREFIX", tessdata_path);
        }

        log::debug!(
            "[Tesseract] 执行: {} {} -l {} --oem {} --psm {} ({:?})",
            self.config.binary_or_default(),
            temp_input.path().display(),
            self.config.lang_or_default(),
            self.config.oem_or_default(),
            psm,
            kind
        );

        let output = cmd
            .output()
            .map_err(|e| OcrError::Process(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Process(format!("退出码 {:?}: {}", output.status.code(), stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for TesseractEngine {
    fn extract_text(&self, image: &DynamicImage, psm: u8) -> Result<String, OcrError> {
        let start = Instant::now();
        let text = self.run(image, psm, OutputKind::Text)?;
        log::debug!(
            "[Tesseract] 全文提取完成 (psm {})，耗时: {} ms",
            psm,
            start.elapsed().as_millis()
        );
        Ok(text)
    }

    fn extract_regions(&self, image: &DynamicImage, psm: u8) -> Result<Vec<TextRegion>, OcrError> {
        let start = Instant::now();
        let tsv = self.run(image, psm, OutputKind::Tsv)?;
        let regions = parse_tesseract_tsv(&tsv, psm)?;
        log::debug!(
            "[Tesseract] 版面提取完成 (psm {})，耗时: {} ms，结果数: {}",
            psm,
            start.elapsed().as_millis(),
            regions.len()
        );
        Ok(regions)
    }
}

/// 临时图片文件，离开作用域时删除
struct TempImage {
    path: PathBuf,
}

impl TempImage {
    fn new(dir: &Path) -> Self {
        let name = format!("tesseract_input_{}.png", uuid::Uuid::new_v4().simple());
        Self { path: dir.join(name) }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// 解析 Tesseract TSV 输出
///
/// TSV 格式：
/// level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
///
/// 只返回单词级别 (level=5) 的结果，每个词有独立的像素坐标。
pub fn parse_tesseract_tsv(tsv: &str, psm: u8) -> Result<Vec<TextRegion>, OcrError> {
    let mut lines = tsv.lines();
    match lines.next() {
        Some(header) if header.starts_with("level") => {}
        Some(other) => return Err(OcrError::Parse(format!("意外的表头: {}", other))),
        None => return Ok(Vec::new()),
    }

    let mut results = Vec::new();
    for line in lines {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let level: i32 = cols[0].parse().unwrap_or(-1);
        let text = cols[11].trim();
        if level != 5 || text.is_empty() {
            continue;
        }

        let left: i32 = cols[6].parse().unwrap_or(0);
        let top: i32 = cols[7].parse().unwrap_or(0);
        let width: u32 = cols[8].parse().unwrap_or(0);
        let height: u32 = cols[9].parse().unwrap_or(0);
        let conf: f32 = cols[10].parse().unwrap_or(-1.0);

        results.push(TextRegion {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            confidence: conf / 100.0, // Tesseract 置信度是 0-100
            psm,
        });
    }

    Ok(results)
}

/// 获取 Tesseract 版本
pub fn get_tesseract_version(binary_path: &str) -> Result<String, OcrError> {
    let output = Command::new(binary_path)
        .arg("--version")
        .output()
        .map_err(|e| OcrError::Process(format!("无法执行 {}: {}", binary_path, e)))?;

    if !output.status.success() {
        return Err(OcrError::Process("tesseract --version 执行失败".to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{}{}", stdout, stderr);

    Ok(parse_version(&combined).unwrap_or_else(|| "unknown".to_string()))
}

/// 格式通常是 "tesseract 5.3.0" 或 "tesseract v5.3.0"
fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.contains("tesseract"))
        .find_map(|line| {
            line.split_whitespace()
                .nth(1)
                .map(|v| v.trim_start_matches('v').to_string())
        })
}

/// 获取 Tesseract 可用语言列表
pub fn get_tesseract_langs(
    binary_path: &str,
    tessdata_path: Option<&str>,
) -> Result<Vec<String>, OcrError> {
    let mut cmd = Command::new(binary_path);
    cmd.arg("--list-langs");

    if let Some(path) = tessdata_path {
        cmd.env("TESSDATA_PREFIX", path);
    }

    let output = cmd
        .output()
        .map_err(|e| OcrError::Process(format!("执行失败: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(parse_langs(&format!("{}{}", stdout, stderr)))
}

fn parse_langs(output: &str) -> Vec<String> {
    let mut langs = Vec::new();
    let mut found_list = false;

    for line in output.lines() {
        let line = line.trim();
        if line.contains("List of available languages") || line.contains("traineddata") {
            found_list = true;
            continue;
        }
        if found_list && !line.is_empty() && !line.contains(':') {
            langs.push(line.to_string());
        }
    }

    langs
}
