//! 视觉检测错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("执行检测程序失败: {0}")]
    Process(String),

    #[error("解析检测结果失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("图像读写失败: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
