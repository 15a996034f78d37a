//! PDF to JPEG converter - entry point
//!
//! Reads one JSON request from stdin, converts the PDF it carries, and
//! writes one JSON response to stdout. Logs go to stderr.

use pdf2jpeg::{ConvertHandler, Request};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf2jpeg=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Environment diagnostics; logged only, never validated
    tracing::debug!(
        path = %std::env::var("PATH").unwrap_or_else(|_| "Not set".into()),
        ld_library_path = %std::env::var("LD_LIBRARY_PATH").unwrap_or_else(|_| "Not set".into()),
        "runtime environment"
    );

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let request: Request = serde_json::from_str(&input)?;

    let handler = ConvertHandler::new();
    let response = handler.handle(request).await;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
