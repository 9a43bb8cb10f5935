//! 单文档处理流程
//!
//! PDF 先栅格化，每页依次经过方向搜索、视觉复核，最后决定写出遮盖结果
//! 还是把原文件复制到未处理目录。所有临时文件在任何退出路径上都会删除。

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use uid_ocr::TextExtractor;
use uid_pdf::PageRasterizer;
use uid_render::{PageImage, SkewOptions};
use uid_verify::{ObjectDetector, VisualCrossChecker};

use crate::batch::output_path_for;
use crate::config::RedactConfig;
use crate::extract::CandidateExtractor;
use crate::orientation::OrientationNormalizer;
use crate::redact::{has_pdf_extension, RedactionEngine};
use crate::{DocumentResult, Result};

/// 外部引擎，worker 之间只读共享
#[derive(Clone)]
pub struct Engines {
    pub text: Arc<dyn TextExtractor>,
    pub detector: Arc<dyn ObjectDetector>,
    pub rasterizer: Arc<dyn PageRasterizer>,
}

/// 临时文件登记，离开作用域时删除
struct TempFiles {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl TempFiles {
    fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            paths: Vec::new(),
        })
    }

    fn register(&mut self, prefix: &str, ext: &str) -> PathBuf {
        let path = self
            .dir
            .join(format!("{}_{}.{}", prefix, uuid::Uuid::new_v4().simple(), ext));
        self.paths.push(path.clone());
        path
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    log::warn!("[Pipeline] 删除临时文件失败 {}: {}", path.display(), e);
                }
            }
        }
    }
}

pub struct DocumentPipeline {
    normalizer: OrientationNormalizer,
    checker: VisualCrossChecker,
    rasterizer: Arc<dyn PageRasterizer>,
    work_dir: PathBuf,
    unprocessed_dir: PathBuf,
}

impl DocumentPipeline {
    pub fn new(config: &RedactConfig, engines: &Engines) -> Self {
        let psm = config.psm_or_default();
        let extractor = CandidateExtractor::new(engines.text.clone(), psm.clone());
        let redactor = RedactionEngine::new(engines.text.clone(), psm, config.mask_rgb(), config.pdf_dpi);
        let skew = config.skew_correction.then(SkewOptions::default);

        Self {
            normalizer: OrientationNormalizer::new(extractor, redactor, skew, config.strict_checksum),
            checker: VisualCrossChecker::new(engines.detector.clone()),
            rasterizer: engines.rasterizer.clone(),
            work_dir: config.work_dir_or_default(),
            unprocessed_dir: config.unprocessed_dir_or_default(),
        }
    }

    pub fn unprocessed_dir(&self) -> &Path {
        &self.unprocessed_dir
    }

    /// 处理单个文档，错误转为 `Failed` 结果
    pub fn process(&self, input: &Path, output_dir: &Path) -> DocumentResult {
        let start = Instant::now();
        match self.try_process(input, output_dir) {
            Ok(result) => {
                log::info!(
                    "[Pipeline] {} -> {:?}，耗时: {} ms",
                    input.display(),
                    result.outcome,
                    start.elapsed().as_millis()
                );
                result
            }
            Err(e) => {
                log::error!("[Pipeline] 处理失败 {}: {}", input.display(), e);
                DocumentResult::failed(input, e.to_string())
            }
        }
    }

    fn try_process(&self, input: &Path, output_dir: &Path) -> Result<DocumentResult> {
        let mut temps = TempFiles::new(&self.work_dir)?;
        let is_pdf = has_pdf_extension(input);

        let pages: Vec<PageImage> = if is_pdf {
            self.rasterizer
                .rasterize(input)?
                .into_iter()
                .map(|page| page.to_rgb8())
                .collect()
        } else {
            vec![image::open(input)?.to_rgb8()]
        };
        log::info!("[Pipeline] 开始处理 {}，共 {} 页", input.display(), pages.len());

        let mut any_found = false;
        let mut masked_pages = Vec::with_capacity(pages.len());
        for (index, page) in pages.into_iter().enumerate() {
            let (masked, found) = self.process_page(page, &mut temps)?;
            log::debug!("[Pipeline] 第 {} 页: found={}", index + 1, found);
            any_found |= found;
            masked_pages.push(masked);
        }

        if !any_found {
            let copied_to = self.copy_unprocessed(input)?;
            return Ok(DocumentResult::unprocessed(input, copied_to));
        }

        let output = output_path_for(input, output_dir);
        let redactor = self.normalizer.redactor();
        if is_pdf {
            let pages: Vec<DynamicImage> = masked_pages.into_iter().map(DynamicImage::ImageRgb8).collect();
            uid_pdf::write_images_as_pdf(&pages, &output, redactor.pdf_dpi())?;
        } else if let Some(page) = masked_pages.first() {
            redactor.write_masked(page, &output)?;
        }

        Ok(DocumentResult::redacted(input, output))
    }

    /// 方向搜索 + 视觉复核，返回遮盖后的页面和是否找到号码
    fn process_page(&self, page: PageImage, temps: &mut TempFiles) -> Result<(PageImage, bool)> {
        let result = self.normalizer.find_and_mask(page);
        let mut found = result.found();

        let working = temps.register("page", "png");
        result.image.save(&working)?;

        // 检测器找到号码区域时已在文件上涂黑，同样算找到
        if !self.checker.confirm(&working)? {
            found = true;
        }

        let masked = image::open(&working)?.to_rgb8();
        Ok((masked, found))
    }

    fn copy_unprocessed(&self, input: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.unprocessed_dir)?;
        let name = input.file_name().unwrap_or(input.as_os_str());
        let dest = self.unprocessed_dir.join(name);
        std::fs::copy(input, &dest)?;
        log::info!("[Pipeline] 未找到号码，已复制到 {}", dest.display());
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_files_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut temps = TempFiles::new(dir.path()).unwrap();
            let path = temps.register("page", "png");
            std::fs::write(&path, b"x").unwrap();
            // 登记了但没有创建的文件不报错
            temps.register("page", "png");
            path
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
