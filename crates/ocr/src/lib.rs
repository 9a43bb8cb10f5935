//! Tesseract 文字提取
//!
//! 通过 CLI 调用 Tesseract，提供全文和词级别版面两种提取方式。

mod engine;
mod error;
mod tesseract;

pub use engine::{TextExtractor, TextRegion};
pub use error::OcrError;
pub use tesseract::{
    get_tesseract_langs, get_tesseract_version, parse_tesseract_tsv, TesseractConfig,
    TesseractEngine,
};
