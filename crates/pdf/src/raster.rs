//! PDF 页面栅格化（pdfium）

use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{PdfError, Result};

/// 默认栅格化 DPI
pub const DEFAULT_DPI: u32 = 120;

/// PDF 转图片能力
pub trait PageRasterizer: Send + Sync {
    /// 按页序返回每一页的图像
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>>;
}

/// 获取 pdfium 库的搜索路径
fn get_pdfium_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            // 可执行文件同级的 libs 目录
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());
        }
    }

    // 本地开发
    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

/// 尝试绑定 pdfium 库
fn bind_pdfium() -> Result<Pdfium> {
    for path in get_pdfium_search_paths() {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(&path);
        log::debug!("[Pdf] 尝试加载 pdfium: {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::info!("[Pdf] 成功从 {:?} 加载 pdfium", path);
            return Ok(Pdfium::new(bindings));
        }
    }

    log::debug!("[Pdf] 尝试加载系统 pdfium 库");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PdfError::Pdfium(format!("pdfium 库不可用: {}", e)))
}

/// 基于 pdfium 的栅格化
///
/// 每次调用重新绑定库，实例本身只保存 DPI，可在 worker 间共享。
#[derive(Debug, Clone, Copy)]
pub struct PdfiumRasterizer {
    dpi: u32,
}

impl PdfiumRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

impl Default for PdfiumRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>> {
        let start = Instant::now();
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| PdfError::Pdfium(format!("加载 PDF 失败: {}", e)))?;

        let page_count = document.pages().len();
        if page_count == 0 {
            return Err(PdfError::Empty);
        }

        // PDF 默认 72 DPI
        let scale = self.dpi as f32 / 72.0;
        let mut images = Vec::with_capacity(page_count as usize);

        for page_idx in 0..page_count {
            let page = document
                .pages()
                .get(page_idx)
                .map_err(|e| PdfError::Pdfium(format!("获取页面 {} 失败: {}", page_idx, e)))?;

            let target_width = (page.width().value * scale) as i32;
            let target_height = (page.height().value * scale) as i32;
            let render_config = PdfRenderConfig::new()
                .set_target_width(target_width)
                .set_target_height(target_height);

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| PdfError::Pdfium(format!("渲染页面 {} 失败: {}", page_idx, e)))?;

            log::debug!(
                "[Pdf] 页面 {}: {}x{} px (DPI: {})",
                page_idx,
                target_width,
                target_height,
                self.dpi
            );
            images.push(bitmap.as_image());
        }

        log::info!(
            "[Pdf] 栅格化 {} 页，耗时: {} ms",
            images.len(),
            start.elapsed().as_millis()
        );
        Ok(images)
    }
}
