//! Direct archive downloads over HTTP.
//!
//! Single attempt, streamed to disk. There is no checksum to verify here:
//! a direct archive URL carries no digest, so integrity rests on the
//! transport.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File download failed: {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Download `url` into `dest`, creating parent directories as needed.
///
/// The status line is checked before `dest` is touched, so a non-2xx
/// response leaves nothing behind. Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`DownloadError::Status`] for any status outside 200-299, and
/// [`DownloadError::Http`] / [`DownloadError::Io`] for transport or disk
/// failures.
pub async fn download_file(client: &Client, url: &str, dest: &Path) -> Result<u64, DownloadError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    tracing::debug!(url, dest = %dest.display(), bytes = written, "download complete");

    Ok(written)
}
