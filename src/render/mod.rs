//! Rasterization and JPEG encoding capabilities

pub mod encode;
pub mod rasterizer;

pub use encode::encode_jpeg;
pub use rasterizer::{PageRasterizer, PdfiumRasterizer, RenderOptions};
