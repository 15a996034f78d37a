//! Resolution of the request body into a PDF document on disk

use crate::error::{Error, Result};
use crate::handler::RequestBody;
use base64::Engine;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Where the PDF bytes for one request come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// JSON body naming a remote PDF to download
    RemoteUrl(String),
    /// String body treated as base64-encoded PDF content
    Base64(String),
    /// Raw binary PDF bytes
    Raw(Vec<u8>),
}

/// Classify the request body.
///
/// String bodies are disambiguated by a parse attempt: a JSON object carrying
/// a `pdf_url` key selects the download branch; any other string (including
/// valid JSON of some other shape) is treated as base64-encoded PDF content.
pub fn classify_body(body: &RequestBody) -> Result<BodySource> {
    match body {
        RequestBody::Binary(bytes) => Ok(BodySource::Raw(bytes.clone())),
        RequestBody::Text(text) => {
            if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(text) {
                if let Some(value) = map.get("pdf_url") {
                    return match value.as_str() {
                        Some(url) => Ok(BodySource::RemoteUrl(url.to_string())),
                        None => Err(Error::SourceResolution {
                            reason: "pdf_url must be a string".to_string(),
                        }),
                    };
                }
            }
            Ok(BodySource::Base64(text.clone()))
        }
    }
}

fn validate_pdf_header(data: &[u8], reason: &str) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: reason.to_string(),
        });
    }
    Ok(())
}

/// Materialize the document under a unique name inside the scoped work
/// directory and return its path. The work directory owns the lifetime of
/// the file; nothing here outlives the request.
pub async fn materialize_document(
    source: BodySource,
    work_dir: &Path,
    fetch_timeout: Duration,
    max_download_bytes: u64,
) -> Result<PathBuf> {
    let pdf_path = work_dir.join(format!("input-{}.pdf", Uuid::new_v4()));

    match source {
        BodySource::RemoteUrl(url) => {
            tracing::info!(url = %url, "downloading PDF");
            fetch_to_file(&url, &pdf_path, fetch_timeout, max_download_bytes).await?;
        }
        BodySource::Base64(text) => {
            let engine = base64::engine::general_purpose::STANDARD;
            let data = engine.decode(text.as_bytes())?;
            validate_pdf_header(&data, "Decoded data is not a valid PDF file")?;
            tokio::fs::write(&pdf_path, &data).await?;
        }
        BodySource::Raw(data) => {
            validate_pdf_header(&data, "Request body is not a valid PDF file")?;
            tokio::fs::write(&pdf_path, &data).await?;
        }
    }

    Ok(pdf_path)
}

/// Stream a remote PDF to disk with download size limits.
///
/// Content-Length is checked for early rejection; the byte count is also
/// checked incrementally since the header can be absent or wrong. The PDF
/// header is validated from the first bytes of the stream.
async fn fetch_to_file(
    url: &str,
    dest: &Path,
    fetch_timeout: Duration,
    max_download_bytes: u64,
) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|e| Error::SourceResolution {
        reason: format!("Invalid URL: {}", e),
    })?;

    let client = reqwest::Client::builder()
        .timeout(fetch_timeout)
        .build()
        .map_err(Error::HttpRequest)?;

    let response = client.get(parsed).send().await?;

    if !response.status().is_success() {
        return Err(Error::SourceResolution {
            reason: format!("HTTP request failed with status: {}", response.status()),
        });
    }

    if let Some(content_length) = response.content_length() {
        if content_length > max_download_bytes {
            return Err(Error::DownloadTooLarge {
                size: content_length,
                max_size: max_download_bytes,
            });
        }
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut header: Vec<u8> = Vec::with_capacity(4);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Error::HttpRequest)?;

        if header.len() < 4 {
            let take = chunk.len().min(4 - header.len());
            header.extend_from_slice(&chunk[..take]);
            if header.len() == 4 && header.as_slice() != b"%PDF" {
                return Err(Error::InvalidPdf {
                    reason: "Downloaded data is not a valid PDF file".to_string(),
                });
            }
        }

        written += chunk.len() as u64;
        if written > max_download_bytes {
            return Err(Error::DownloadTooLarge {
                size: written,
                max_size: max_download_bytes,
            });
        }

        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    if written < 4 {
        return Err(Error::InvalidPdf {
            reason: "Downloaded data is not a valid PDF file".to_string(),
        });
    }

    tracing::debug!(bytes = written, dest = %dest.display(), "download complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TIMEOUT: Duration = Duration::from_secs(5);
    const MAX_BYTES: u64 = 10 * 1024 * 1024;

    #[test]
    fn test_classify_json_with_pdf_url() {
        let body = RequestBody::Text(r#"{"pdf_url": "https://example.com/doc.pdf"}"#.to_string());
        let source = classify_body(&body).unwrap();
        assert_eq!(
            source,
            BodySource::RemoteUrl("https://example.com/doc.pdf".to_string())
        );
    }

    #[test]
    fn test_classify_pdf_url_not_a_string() {
        let body = RequestBody::Text(r#"{"pdf_url": 42}"#.to_string());
        let result = classify_body(&body);
        assert!(matches!(result, Err(Error::SourceResolution { .. })));
    }

    // Any string that is not a JSON object with pdf_url falls through to the
    // base64 branch, even when it parses as JSON of some other shape.
    #[rstest]
    #[case(r#"{"foo": 1}"#)]
    #[case(r#"[1, 2, 3]"#)]
    #[case(r#""just a json string""#)]
    #[case("JVBERi0xLjQK")]
    #[case("definitely not json")]
    fn test_classify_falls_through_to_base64(#[case] text: &str) {
        let body = RequestBody::Text(text.to_string());
        let source = classify_body(&body).unwrap();
        assert_eq!(source, BodySource::Base64(text.to_string()));
    }

    #[test]
    fn test_classify_binary_body() {
        let body = RequestBody::Binary(b"%PDF-1.4".to_vec());
        let source = classify_body(&body).unwrap();
        assert_eq!(source, BodySource::Raw(b"%PDF-1.4".to_vec()));
    }

    #[tokio::test]
    async fn test_materialize_base64() {
        let dir = tempfile::tempdir().unwrap();
        let engine = base64::engine::general_purpose::STANDARD;
        let encoded = engine.encode(b"%PDF-1.4\nfake body");
        let path = materialize_document(
            BodySource::Base64(encoded),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await
        .unwrap();
        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data, b"%PDF-1.4\nfake body");
    }

    #[tokio::test]
    async fn test_materialize_invalid_base64() {
        let dir = tempfile::tempdir().unwrap();
        let result = materialize_document(
            BodySource::Base64("not valid base64!!!".to_string()),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await;
        assert!(matches!(result, Err(Error::Base64Decode(_))));
    }

    #[tokio::test]
    async fn test_materialize_base64_not_pdf() {
        let dir = tempfile::tempdir().unwrap();
        // "Hello World" in base64: decodes fine, fails the header check
        let result = materialize_document(
            BodySource::Base64("SGVsbG8gV29ybGQ=".to_string()),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[tokio::test]
    async fn test_materialize_raw_not_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let result = materialize_document(
            BodySource::Raw(b"GIF89a".to_vec()),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[tokio::test]
    async fn test_materialize_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let first = materialize_document(
            BodySource::Raw(b"%PDF-1.4".to_vec()),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await
        .unwrap();
        let second = materialize_document(
            BodySource::Raw(b"%PDF-1.4".to_vec()),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await
        .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let result = materialize_document(
            BodySource::RemoteUrl("not a url".to_string()),
            dir.path(),
            TIMEOUT,
            MAX_BYTES,
        )
        .await;
        assert!(matches!(result, Err(Error::SourceResolution { .. })));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_url() {
        let dir = tempfile::tempdir().unwrap();
        let result = materialize_document(
            BodySource::RemoteUrl("http://127.0.0.1:1/doc.pdf".to_string()),
            dir.path(),
            Duration::from_secs(2),
            MAX_BYTES,
        )
        .await;
        assert!(matches!(result, Err(Error::HttpRequest(_))));
    }

    /// Serve a single canned HTTP response on an ephemeral port
    async fn serve_once(response: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/doc.pdf", addr)
    }

    fn http_response(status_line: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    #[tokio::test]
    async fn test_fetch_success_writes_file() {
        let body = b"%PDF-1.4\nremote content";
        let url = serve_once(http_response("200 OK", body)).await;

        let dir = tempfile::tempdir().unwrap();
        let path = materialize_document(BodySource::RemoteUrl(url), dir.path(), TIMEOUT, MAX_BYTES)
            .await
            .unwrap();
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data, body);
    }

    #[tokio::test]
    async fn test_fetch_content_length_over_cap() {
        let body = vec![b'x'; 256];
        let url = serve_once(http_response("200 OK", &body)).await;

        let dir = tempfile::tempdir().unwrap();
        let result =
            materialize_document(BodySource::RemoteUrl(url), dir.path(), TIMEOUT, 16).await;
        assert!(matches!(result, Err(Error::DownloadTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_fetch_non_pdf_content() {
        let url = serve_once(http_response("200 OK", b"<html>not a pdf</html>")).await;

        let dir = tempfile::tempdir().unwrap();
        let result =
            materialize_document(BodySource::RemoteUrl(url), dir.path(), TIMEOUT, MAX_BYTES).await;
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let url = serve_once(http_response("404 Not Found", b"")).await;

        let dir = tempfile::tempdir().unwrap();
        let result =
            materialize_document(BodySource::RemoteUrl(url), dir.path(), TIMEOUT, MAX_BYTES).await;
        assert!(matches!(result, Err(Error::SourceResolution { .. })));
    }
}
