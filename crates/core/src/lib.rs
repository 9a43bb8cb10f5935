//! Core orchestration: orientation search, redaction, per-document pipeline and batch scheduling.

mod batch;
mod config;
mod extract;
mod orientation;
mod pipeline;
mod quota;
mod redact;

pub use batch::{list_documents, output_path_for, BatchScheduler, ACCEPTED_EXTENSIONS};
pub use config::{RedactConfig, DEFAULT_PSM, DEFAULT_QUOTA_CEILING};
pub use extract::CandidateExtractor;
pub use orientation::{OrientationNormalizer, OrientationResult, Quarter};
pub use pipeline::{DocumentPipeline, Engines};
pub use quota::{InMemoryQuotaStore, ProcessedQuota, QuotaStore};
pub use redact::RedactionEngine;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("input folder does not exist: {}", .0.display())]
    InputFolderMissing(PathBuf),
    #[error("processing quota exhausted: {used}/{ceiling}")]
    QuotaExhausted { used: u64, ceiling: u64 },
    #[error("quota store error: {0}")]
    Quota(String),
    #[error("worker pool error: {0}")]
    WorkerPool(String),
    #[error("ocr error: {0}")]
    Ocr(#[from] uid_ocr::OcrError),
    #[error("pdf error: {0}")]
    Pdf(#[from] uid_pdf::PdfError),
    #[error("visual check error: {0}")]
    Verify(#[from] uid_verify::VerifyError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 单个文档的处理结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentOutcome {
    /// 找到号码并写出遮盖结果
    Redacted,
    /// 未找到号码，原文件复制到未处理目录
    Unprocessed,
    /// 处理出错
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResult {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub redacted: bool,
    pub outcome: DocumentOutcome,
    pub reason: Option<String>,
}

impl DocumentResult {
    pub fn redacted(input: &Path, output: PathBuf) -> Self {
        Self {
            input: input.to_path_buf(),
            output: Some(output),
            redacted: true,
            outcome: DocumentOutcome::Redacted,
            reason: None,
        }
    }

    pub fn unprocessed(input: &Path, copied_to: PathBuf) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            redacted: false,
            outcome: DocumentOutcome::Unprocessed,
            reason: Some(format!("no identifier found, copied to {}", copied_to.display())),
        }
    }

    pub fn failed(input: &Path, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            redacted: false,
            outcome: DocumentOutcome::Failed,
            reason: Some(reason.into()),
        }
    }
}

/// 一次批处理的汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub results: Vec<DocumentResult>,
    /// 超出配额未处理的文件数
    pub skipped_by_quota: usize,
    /// 批处理结束后的配额计数
    pub quota_used: u64,
}

impl BatchReport {
    fn count(&self, outcome: DocumentOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn redacted(&self) -> usize {
        self.count(DocumentOutcome::Redacted)
    }

    pub fn unprocessed(&self) -> usize {
        self.count(DocumentOutcome::Unprocessed)
    }

    pub fn failed(&self) -> usize {
        self.count(DocumentOutcome::Failed)
    }
}
