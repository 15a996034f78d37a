//! Request handler: one conversion request in, one JSON response out

use crate::error::Result;
use crate::render::{encode_jpeg, PageRasterizer, PdfiumRasterizer, RenderOptions};
use crate::source::{classify_body, materialize_document};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The invocation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

/// Request body: a string (either JSON naming a `pdf_url` or base64 PDF
/// content) or raw PDF bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Text(String),
    Binary(Vec<u8>),
}

/// The invocation response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// JSON-serialized payload
    pub body: String,
}

impl Response {
    fn json(status_code: u16, body: serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }
}

/// One rendered page, ready for the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImage {
    pub filename: String,
    /// Base64-encoded JPEG bytes
    pub content: String,
    pub content_type: String,
}

/// Successful conversion payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub images: Vec<PageImage>,
    pub total_pages: usize,
}

/// Conversion parameters
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Rendering resolution (default: 150 DPI)
    pub render_dpi: u32,
    /// JPEG encoder quality (default: 75)
    pub jpeg_quality: u8,
    /// Worker count hint passed to the rasterizer (default: 2)
    pub rasterizer_workers: usize,
    /// Timeout for URL downloads (default: 60s)
    pub fetch_timeout: Duration,
    /// Maximum download size in bytes for URL sources (default: 100MB)
    pub max_download_bytes: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            render_dpi: 150,
            jpeg_quality: 75,
            rasterizer_workers: 2,
            fetch_timeout: Duration::from_secs(60),
            max_download_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Handles one conversion request start to finish
pub struct ConvertHandler {
    rasterizer: Arc<dyn PageRasterizer>,
    config: HandlerConfig,
}

impl ConvertHandler {
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::default())
    }

    pub fn with_config(config: HandlerConfig) -> Self {
        Self {
            rasterizer: Arc::new(PdfiumRasterizer::new()),
            config,
        }
    }

    /// Substitute the rasterization backend. Used by tests to exercise the
    /// request contract without a PDFium library present.
    pub fn with_rasterizer(rasterizer: Arc<dyn PageRasterizer>, config: HandlerConfig) -> Self {
        Self { rasterizer, config }
    }

    /// Handle one request.
    ///
    /// Never fails to the caller: a missing body short-circuits with a 400,
    /// and every failure past that check becomes a 500 with the failure
    /// message embedded in the payload.
    pub async fn handle(&self, request: Request) -> Response {
        let Some(body) = request.body else {
            return Response::json(
                400,
                serde_json::json!({ "error": "No body found in request" }),
            );
        };

        match self.convert(body).await {
            Ok(result) => {
                tracing::info!(total_pages = result.total_pages, "conversion succeeded");
                Response::json(
                    200,
                    serde_json::json!({
                        "images": result.images,
                        "total_pages": result.total_pages,
                    }),
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "conversion failed");
                Response::json(
                    500,
                    serde_json::json!({
                        "error": e.to_string(),
                        "details": "Check logs for more information",
                    }),
                )
            }
        }
    }

    async fn convert(&self, body: RequestBody) -> Result<ConversionResult> {
        // Scoped workspace for the input file and any intermediate
        // artifacts; removed when dropped, on every exit path
        let work_dir = tempfile::Builder::new().prefix("pdf2jpeg-").tempdir()?;

        let source = classify_body(&body)?;
        let pdf_path = materialize_document(
            source,
            work_dir.path(),
            self.config.fetch_timeout,
            self.config.max_download_bytes,
        )
        .await?;

        let options = RenderOptions {
            dpi: self.config.render_dpi,
            worker_threads: self.config.rasterizer_workers,
            scratch_dir: work_dir.path().to_path_buf(),
        };

        let rasterizer = Arc::clone(&self.rasterizer);
        let quality = self.config.jpeg_quality;

        let images = tokio::task::spawn_blocking(move || {
            let pages = rasterizer.rasterize(&pdf_path, &options)?;
            tracing::info!(pages = pages.len(), "rendered document");

            let engine = base64::engine::general_purpose::STANDARD;
            let mut images = Vec::with_capacity(pages.len());
            for (i, page) in pages.iter().enumerate() {
                let jpeg = encode_jpeg(page, quality)?;
                images.push(PageImage {
                    filename: format!("page_{}.jpg", i + 1),
                    content: engine.encode(&jpeg),
                    content_type: "image/jpeg".to_string(),
                });
            }

            Ok::<_, crate::error::Error>(images)
        })
        .await
        .map_err(|e| crate::error::Error::Pdfium {
            reason: format!("Task join error: {}", e),
        })??;

        let total_pages = images.len();
        Ok(ConversionResult {
            images,
            total_pages,
        })
    }
}

impl Default for ConvertHandler {
    fn default() -> Self {
        Self::new()
    }
}
