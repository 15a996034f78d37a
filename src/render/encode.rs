//! In-memory JPEG encoding of rendered pages

use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;

/// Encode a rendered page as JPEG bytes.
///
/// PDFium bitmaps carry an alpha channel, which JPEG cannot represent, so
/// the image is flattened to RGB8 first.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    image.to_rgb8().write_with_encoder(encoder)?;
    Ok(bytes)
}
