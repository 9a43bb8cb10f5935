//! 批处理调度
//!
//! 固定大小的 rayon 线程池，每个文档由一个 worker 独占处理。
//! 配额在分发前读取、全部 worker 结束后由调度线程写回。

use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::DocumentPipeline;
use crate::quota::ProcessedQuota;
use crate::{BatchReport, CoreError, DocumentResult, Result};

/// 接受的文件扩展名（不区分大小写）
pub const ACCEPTED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "pdf", "bmp", "gif", "tiff"];

/// 输出文件名：`{stem}_masked{ext}`
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_masked.{}", stem, ext.to_string_lossy()),
        None => format!("{}_masked", stem),
    };
    output_dir.join(name)
}

fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// 列出目录下可处理的文件，按文件名排序
pub fn list_documents(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && is_accepted(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

pub struct BatchScheduler {
    pipeline: Arc<DocumentPipeline>,
    quota: ProcessedQuota,
    workers: usize,
}

impl BatchScheduler {
    pub fn new(pipeline: Arc<DocumentPipeline>, quota: ProcessedQuota, workers: usize) -> Self {
        Self {
            pipeline,
            quota,
            workers: workers.max(1),
        }
    }

    pub fn run_batch(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        let start = Instant::now();
        if !input_dir.is_dir() {
            log::error!("[Batch] 输入目录不存在: {}", input_dir.display());
            return Err(CoreError::InputFolderMissing(input_dir.to_path_buf()));
        }

        let used = self.quota.used()?;
        let ceiling = self.quota.ceiling();
        if used >= ceiling {
            log::error!("[Batch] 处理配额已用完: {}/{}", used, ceiling);
            return Err(CoreError::QuotaExhausted { used, ceiling });
        }

        let mut files = list_documents(input_dir)?;
        let allowed = usize::try_from(ceiling - used).unwrap_or(usize::MAX);
        let skipped_by_quota = files.len().saturating_sub(allowed);
        files.truncate(allowed);
        if skipped_by_quota > 0 {
            log::warn!("[Batch] 超出配额，跳过 {} 个文件", skipped_by_quota);
        }

        std::fs::create_dir_all(output_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("uid-worker-{}", i))
            .build()
            .map_err(|e| CoreError::WorkerPool(e.to_string()))?;

        log::info!("[Batch] 开始处理 {} 个文件，worker: {}", files.len(), self.workers);
        let results: Vec<DocumentResult> = pool.install(|| {
            files
                .par_iter()
                .map(|path| self.process_isolated(path, output_dir))
                .collect()
        });

        let quota_used = self.quota.advance(used, results.len() as u64)?;
        let report = BatchReport {
            results,
            skipped_by_quota,
            quota_used,
        };

        log::info!(
            "[Batch] 完成: 遮盖 {}，未处理 {}，失败 {}，耗时: {} ms",
            report.redacted(),
            report.unprocessed(),
            report.failed(),
            start.elapsed().as_millis()
        );
        Ok(report)
    }

    /// panic 只影响当前文档
    fn process_isolated(&self, input: &Path, output_dir: &Path) -> DocumentResult {
        catch_unwind(AssertUnwindSafe(|| self.pipeline.process(input, output_dir))).unwrap_or_else(|payload| {
            let message = panic_message(payload);
            log::error!("[Batch] worker panic {}: {}", input.display(), message);
            DocumentResult::failed(input, format!("panic: {}", message))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for() {
        let out = Path::new("/out");
        assert_eq!(output_path_for(Path::new("/in/card.png"), out), PathBuf::from("/out/card_masked.png"));
        assert_eq!(output_path_for(Path::new("/in/scan.v2.PDF"), out), PathBuf::from("/out/scan.v2_masked.PDF"));
        assert_eq!(output_path_for(Path::new("/in/noext"), out), PathBuf::from("/out/noext_masked"));
    }

    #[test]
    fn test_list_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "c.pdf", "notes.txt", "d.tiff", "e.webp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let names: Vec<String> = list_documents(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPG", "c.pdf", "d.tiff"]);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(7_u8)), "worker panicked");
    }
}
