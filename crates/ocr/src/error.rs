//! OCR 错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("执行 tesseract 失败: {0}")]
    Process(String),

    #[error("图像处理失败: {0}")]
    ImageProcess(String),

    #[error("解析 OCR 输出失败: {0}")]
    Parse(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}
