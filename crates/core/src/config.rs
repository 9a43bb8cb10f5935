//! 脱敏流程配置

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use uid_ocr::TesseractConfig;
use uid_verify::{DetectorConfig, DEFAULT_IDENTIFIER_LABEL};

/// 默认页面分割模式
pub const DEFAULT_PSM: [u8; 3] = [3, 4, 6];
/// 默认处理配额
pub const DEFAULT_QUOTA_CEILING: u64 = 600;

const DEFAULT_MAX_WORKERS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedactConfig {
    /// Tesseract 页面分割模式，按顺序尝试
    pub psm: Vec<u8>,
    /// 遮盖颜色 RGB
    pub mask_color: [u8; 3],
    /// 是否在方向搜索前校正小角度倾斜
    pub skew_correction: bool,
    /// 是否要求候选号码通过校验位检查
    pub strict_checksum: bool,
    /// PDF 栅格化 DPI
    pub pdf_dpi: u32,
    /// 累计处理文档数上限
    pub quota_ceiling: u64,
    /// worker 数量，为空时按 CPU 核数
    pub workers: Option<usize>,
    /// 未找到号码的文档复制到此目录
    pub unprocessed_dir: Option<PathBuf>,
    /// 临时文件目录
    pub work_dir: Option<PathBuf>,
    /// 检测器中代表号码区域的标签
    pub identifier_label: String,
    pub tesseract: TesseractConfig,
    pub detector: DetectorConfig,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            psm: DEFAULT_PSM.to_vec(),
            mask_color: [0, 0, 0],
            skew_correction: true,
            strict_checksum: true,
            pdf_dpi: uid_pdf::DEFAULT_DPI,
            quota_ceiling: DEFAULT_QUOTA_CEILING,
            workers: None,
            unprocessed_dir: None,
            work_dir: None,
            identifier_label: DEFAULT_IDENTIFIER_LABEL.to_string(),
            tesseract: TesseractConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl RedactConfig {
    pub fn mask_rgb(&self) -> Rgb<u8> {
        Rgb(self.mask_color)
    }

    /// 为空时退回默认 PSM 列表
    pub fn psm_or_default(&self) -> Vec<u8> {
        if self.psm.is_empty() {
            DEFAULT_PSM.to_vec()
        } else {
            self.psm.clone()
        }
    }

    /// 未处理目录：配置值，或 `~/Documents/unprocessed_files`，或 `./unprocessed_files`
    pub fn unprocessed_dir_or_default(&self) -> PathBuf {
        if let Some(dir) = &self.unprocessed_dir {
            return dir.clone();
        }
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
        if let Some(home) = home {
            let documents = PathBuf::from(home).join("Documents");
            if documents.is_dir() {
                return documents.join("unprocessed_files");
            }
        }
        PathBuf::from("unprocessed_files")
    }

    pub fn work_dir_or_default(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("uid-redact"))
    }

    /// worker 数量，至少为 1
    pub fn worker_count(&self) -> usize {
        self.workers.filter(|n| *n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(DEFAULT_MAX_WORKERS)
                .max(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedactConfig::default();
        assert_eq!(config.psm, vec![3, 4, 6]);
        assert_eq!(config.mask_rgb(), Rgb([0, 0, 0]));
        assert_eq!(config.pdf_dpi, 120);
        assert_eq!(config.quota_ceiling, 600);
        assert_eq!(config.identifier_label, "AADHAR_NUMBER");
        assert!(config.strict_checksum);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RedactConfig =
            serde_json::from_str(r#"{"psm": [6], "quotaCeiling": 10, "tesseract": {"lang": "eng+hin"}}"#)
                .unwrap();
        assert_eq!(config.psm, vec![6]);
        assert_eq!(config.quota_ceiling, 10);
        assert_eq!(config.tesseract.lang_or_default(), "eng+hin");
        assert_eq!(config.pdf_dpi, 120);
        assert!(config.detector.command.is_none());
    }

    #[test]
    fn test_json_round_trip_keeps_camel_case() {
        let mut config = RedactConfig::default();
        config.workers = Some(3);
        config.unprocessed_dir = Some(PathBuf::from("/data/review"));
        let raw = serde_json::to_string(&config).unwrap();
        assert!(raw.contains("\"maskColor\""));
        assert!(raw.contains("\"unprocessedDir\""));

        let back: RedactConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.worker_count(), 3);
        assert_eq!(back.unprocessed_dir_or_default(), PathBuf::from("/data/review"));
    }

    #[test]
    fn test_empty_psm_falls_back() {
        let config = RedactConfig { psm: Vec::new(), ..Default::default() };
        assert_eq!(config.psm_or_default(), vec![3, 4, 6]);
    }
}
