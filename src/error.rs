//! Error types for the PDF to JPEG conversion pipeline

use thiserror::Error;

/// Result type alias for the conversion pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the conversion pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// Source resolution error
    #[error("Failed to resolve PDF source: {reason}")]
    SourceResolution { reason: String },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Download too large
    #[error("Download too large: {size} bytes (max: {max_size} bytes)")]
    DownloadTooLarge { size: u64, max_size: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Image encoding error
    #[error("Image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),
}
