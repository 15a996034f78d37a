//! Page rasterization backends

use crate::error::{Error, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Rendering parameters passed to the rasterization backend
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Target resolution in dots per inch
    pub dpi: u32,
    /// Worker count hint for the backend's internal use. Advisory only;
    /// backends may render sequentially.
    pub worker_threads: usize,
    /// Scoped directory for intermediate rendering artifacts
    pub scratch_dir: PathBuf,
}

/// A backend that renders every page of a PDF document, in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf_path: &Path, options: &RenderOptions) -> Result<Vec<DynamicImage>>;
}

/// Production rasterizer backed by PDFium
#[derive(Debug, Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self
    }
}

fn create_pdfium() -> Result<Pdfium> {
    // Try to bind to a local library, then the layer location, then the
    // system library
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path, options: &RenderOptions) -> Result<Vec<DynamicImage>> {
        let pdfium = create_pdfium()?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to open PDF: {}", e),
            })?;

        // 1 PDF point = 1/72 inch
        let scale = options.dpi as f32 / 72.0;
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let page_count = document.pages().len();
        tracing::debug!(
            pages = page_count,
            dpi = options.dpi,
            workers = options.worker_threads,
            "rasterizing document"
        );

        let mut images = Vec::with_capacity(page_count as usize);
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page.render_with_config(&config).map_err(|e| Error::Pdfium {
                reason: format!("Failed to render page {}: {}", index + 1, e),
            })?;
            images.push(bitmap.as_image());
        }

        Ok(images)
    }
}
