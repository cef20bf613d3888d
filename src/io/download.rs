//! Streaming download with progress reporting.
//!
//! Release assets are streamed straight to disk while a SHA256 digest is
//! computed over the bytes. Upstream publishes no checksums for these
//! assets, so the digest is returned for logging rather than verified.

use std::io::Write;
use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download `url` to `dest`, streaming chunks and reporting progress.
///
/// Returns the hex SHA256 digest of the downloaded bytes. There is no
/// retry: a failed transfer leaves whatever was written at `dest` and
/// surfaces the error to the caller.
pub async fn download<R: Reporter>(
    client: &Client,
    url: &str,
    dest: &Path,
    reporter: &R,
) -> Result<String, DownloadError> {
    let name = crate::stage::filename_from_url(url).to_string();

    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let total_size = response.content_length();
    reporter.downloading(&name, 0, total_size);

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        reporter.downloading(&name, downloaded, total_size);
    }

    file.flush().await?;
    Ok(hex::encode(hasher.finalize()))
}
