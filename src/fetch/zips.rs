use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, instrument, warn};
use url::Url;

use super::archive::ArchiveReader;

/// Download the archive at `url_str` and open it from memory.
///
/// The response status is not checked: whatever body comes back is handed
/// to the zip reader, so an error page surfaces as an invalid-archive error.
#[instrument(level = "info", skip(client))]
pub async fn fetch_archive(client: &Client, url_str: &str) -> Result<ArchiveReader> {
    let url = Url::parse(url_str).with_context(|| format!("parsing source URL {}", url_str))?;

    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%url, %status, "non-success status, reading body as archive anyway");
    }

    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    info!(%url, size_bytes = bytes.len(), "downloaded archive");

    ArchiveReader::from_bytes(bytes.to_vec())
}
