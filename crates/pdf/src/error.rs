//! PDF 错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Pdfium 不可用或渲染失败: {0}")]
    Pdfium(String),

    #[error("写入 PDF 失败: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("图像编码失败: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF 没有页面")]
    Empty,
}

pub type Result<T> = std::result::Result<T, PdfError>;
