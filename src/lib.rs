//! PDF to JPEG Conversion Library
//!
//! This crate converts a PDF into per-page JPEG images for a single
//! request/response exchange:
//! - the request body carries the PDF inline (binary or base64) or names a
//!   `pdf_url` to download
//! - every page is rendered at 150 DPI and returned as a base64 JPEG payload
//!   in one JSON response

pub mod error;
pub mod handler;
pub mod render;
pub mod source;

pub use error::{Error, Result};
pub use handler::{
    ConversionResult, ConvertHandler, HandlerConfig, PageImage, Request, RequestBody, Response,
};
pub use render::{PageRasterizer, PdfiumRasterizer, RenderOptions};
