//! PDF rasterization and raster-to-PDF assembly.

mod error;
mod raster;
mod writer;

pub use error::{PdfError, Result};
pub use raster::{PageRasterizer, PdfiumRasterizer, DEFAULT_DPI};
pub use writer::write_images_as_pdf;
