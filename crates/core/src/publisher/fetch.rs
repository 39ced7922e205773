//! Media source download and hosting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::PublisherError;

const DEFAULT_EXTENSION: &str = "mp4";

/// Failure to make a rendered file publicly reachable.
#[derive(Debug, Clone, Error)]
#[error("media hosting failed: {0}")]
pub struct HostingError(pub String);

/// Uploads rendered media somewhere public.
///
/// Container-based platforms (Instagram) fetch media by URL. Without a host
/// the publisher passes the original remote source URL through.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn host(&self, path: &Path) -> Result<String, HostingError>;
}

/// Streams remote media sources to disk.
pub struct MediaFetcher {
    client: Client,
    max_bytes: u64,
}

impl MediaFetcher {
    /// `max_bytes` of 0 disables the size cap.
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, PublisherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublisherError::download("<client>", format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, max_bytes })
    }

    /// Downloads `url` into `dir`, returning the written path.
    pub async fn fetch(&self, url: &str, dir: &Path) -> Result<PathBuf, PublisherError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PublisherError::download(url, "only http(s) sources are supported"));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PublisherError::download(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublisherError::download(url, format!("HTTP {}", status)));
        }
        if let Some(len) = response.content_length() {
            if self.max_bytes > 0 && len > self.max_bytes {
                return Err(PublisherError::download(
                    url,
                    format!("{} bytes exceeds the {} byte limit", len, self.max_bytes),
                ));
            }
        }

        let path = dir.join(source_file_name(url));
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| PublisherError::download(url, e))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PublisherError::download(url, e))?;
            written += chunk.len() as u64;
            if self.max_bytes > 0 && written > self.max_bytes {
                return Err(PublisherError::download(
                    url,
                    format!("body exceeds the {} byte limit", self.max_bytes),
                ));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| PublisherError::download(url, e))?;
        }
        file.flush()
            .await
            .map_err(|e| PublisherError::download(url, e))?;

        if written == 0 {
            return Err(PublisherError::download(url, "empty body"));
        }

        debug!("Downloaded {} ({} bytes) to {}", url, written, path.display());
        Ok(path)
    }
}

/// `source.<ext>`, keeping the URL path's extension when it looks like one.
fn source_file_name(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();
    let decoded = urlencoding::decode(&segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.clone());

    let ext = Path::new(&decoded)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    format!("source.{}", ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_name() {
        assert_eq!(source_file_name("https://cdn.example.com/a/clip.MOV"), "source.mov");
        assert_eq!(
            source_file_name("https://cdn.example.com/img/photo.jpg?sig=abc#x"),
            "source.jpg"
        );
        assert_eq!(source_file_name("https://cdn.example.com/stream"), "source.mp4");
        assert_eq!(source_file_name("https://cdn.example.com"), "source.mp4");
        assert_eq!(
            source_file_name("https://cdn.example.com/my%20clip.webm"),
            "source.webm"
        );
        assert_eq!(source_file_name("https://x.io/file.tar.gz-bad!"), "source.mp4");
        assert_eq!(
            source_file_name("https://user@cdn.example.com:8443/v/clip.webm?x=/a.jpg"),
            "source.webm"
        );
        assert_eq!(source_file_name("not a url"), "source.mp4");
    }

    #[tokio::test]
    async fn test_rejects_non_http_source() {
        let fetcher = MediaFetcher::new(Duration::from_secs(1), 0).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let err = fetcher.fetch("ftp://example.com/a.mp4", dir.path()).await.unwrap_err();
        assert!(matches!(err, PublisherError::Download { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_download_error() {
        let fetcher = MediaFetcher::new(Duration::from_secs(2), 0).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let err = fetcher
            .fetch("http://127.0.0.1:9/clip.mp4", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PublisherError::Download { .. }));
    }
}
