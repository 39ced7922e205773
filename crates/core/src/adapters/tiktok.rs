//! TikTok adapter (Content Posting API, direct post with file upload).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::config::TiktokConfig;
use super::error::PublishError;
use super::http;
use super::traits::PlatformAdapter;
use super::types::{PreparedPost, PublishReceipt};
use crate::formats::Platform;

const DEFAULT_BASE_URL: &str = "https://open.tiktokapis.com/v2";
const PLATFORM: Platform = Platform::Tiktok;
const TITLE_MAX_CHARS: usize = 150;
const COVER_TIMESTAMP_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct InitResponse {
    #[serde(default)]
    data: Option<InitData>,
    #[serde(default)]
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct InitData {
    publish_id: String,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    code: String,
    #[serde(default)]
    message: String,
}

/// Byte range of one upload chunk, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkRange {
    start: u64,
    end: u64,
}

/// Publishes videos to a TikTok account.
pub struct TiktokAdapter {
    client: Client,
    base_url: String,
    access_token: String,
    privacy_level: String,
    chunk_size: u64,
}

impl TiktokAdapter {
    pub fn new(config: TiktokConfig, timeout: Duration) -> Result<Self, PublishError> {
        if config.access_token.is_empty() {
            return Err(PublishError::new(PLATFORM, "access_token is required"));
        }
        if config.chunk_size_bytes == 0 {
            return Err(PublishError::new(PLATFORM, "chunk_size_bytes must be positive"));
        }

        Ok(Self {
            client: http::build_client(PLATFORM, timeout)?,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token: config.access_token,
            privacy_level: config.privacy_level,
            chunk_size: config.chunk_size_bytes,
        })
    }
}

/// Splits an upload into chunks.
///
/// A file no larger than one chunk goes up whole; otherwise every chunk is
/// `chunk_size` long and the last one absorbs the remainder.
fn chunk_ranges(size: u64, chunk_size: u64) -> Vec<ChunkRange> {
    if size <= chunk_size {
        return vec![ChunkRange { start: 0, end: size }];
    }
    let count = size / chunk_size;
    (0..count)
        .map(|i| ChunkRange {
            start: i * chunk_size,
            end: if i + 1 == count {
                size
            } else {
                (i + 1) * chunk_size
            },
        })
        .collect()
}

fn title_for(caption: &str) -> String {
    caption.chars().take(TITLE_MAX_CHARS).collect()
}

fn init_body(title: &str, privacy_level: &str, size: u64, ranges: &[ChunkRange]) -> Value {
    let chunk_size = ranges.first().map(|r| r.end - r.start).unwrap_or(size);
    json!({
        "post_info": {
            "title": title,
            "privacy_level": privacy_level,
            "disable_duet": false,
            "disable_comment": false,
            "disable_stitch": false,
            "video_cover_timestamp_ms": COVER_TIMESTAMP_MS
        },
        "source_info": {
            "source": "FILE_UPLOAD",
            "video_size": size,
            "chunk_size": chunk_size,
            "total_chunk_count": ranges.len()
        }
    })
}

fn content_range(range: ChunkRange, size: u64) -> String {
    format!("bytes {}-{}/{}", range.start, range.end.saturating_sub(1), size)
}

#[async_trait]
impl PlatformAdapter for TiktokAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let media = http::require_video(PLATFORM, post)?;
        let bytes = http::read_media(PLATFORM, &media.path).await?;
        let size = bytes.len() as u64;
        if size == 0 {
            return Err(PublishError::new(PLATFORM, "video file is empty"));
        }
        let ranges = chunk_ranges(size, self.chunk_size);

        let response = self
            .client
            .post(format!("{}/post/publish/video/init/", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&init_body(
                &title_for(&post.caption),
                &self.privacy_level,
                size,
                &ranges,
            ))
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let init: InitResponse = http::json(PLATFORM, response).await?;

        if let Some(status) = init.error.as_ref().filter(|s| s.code != "ok") {
            return Err(PublishError::new(
                PLATFORM,
                format!("{}: {}", status.code, status.message),
            ));
        }
        let data = init
            .data
            .ok_or_else(|| PublishError::unexpected(PLATFORM, "init response without data"))?;
        debug!(
            "TikTok publish {} initialised, uploading {} chunk(s)",
            data.publish_id,
            ranges.len()
        );

        for range in &ranges {
            let chunk = bytes[range.start as usize..range.end as usize].to_vec();
            let response = self
                .client
                .put(&data.upload_url)
                .header(reqwest::header::CONTENT_TYPE, media.mime_type())
                .header(reqwest::header::CONTENT_RANGE, content_range(*range, size))
                .body(chunk)
                .send()
                .await
                .map_err(|e| PublishError::transport(PLATFORM, e))?;
            http::check(PLATFORM, response).await?;
        }

        info!("Published to TikTok: publish_id={}", data.publish_id);
        Ok(PublishReceipt::new(data.publish_id, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_small_file_is_single_chunk() {
        let ranges = chunk_ranges(3 * MB, 10 * MB);
        assert_eq!(ranges, vec![ChunkRange { start: 0, end: 3 * MB }]);
        assert_eq!(content_range(ranges[0], 3 * MB), format!("bytes 0-{}/{}", 3 * MB - 1, 3 * MB));
    }

    #[test]
    fn test_last_chunk_absorbs_remainder() {
        let ranges = chunk_ranges(25 * MB + 7, 10 * MB);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], ChunkRange { start: 0, end: 10 * MB });
        assert_eq!(ranges[1], ChunkRange { start: 10 * MB, end: 25 * MB + 7 });
    }

    #[test]
    fn test_init_body() {
        let ranges = chunk_ranges(2048, 4096);
        let body = init_body("title", "SELF_ONLY", 2048, &ranges);
        assert_eq!(body["post_info"]["privacy_level"], "SELF_ONLY");
        assert_eq!(body["post_info"]["video_cover_timestamp_ms"], 1000);
        assert_eq!(body["source_info"]["source"], "FILE_UPLOAD");
        assert_eq!(body["source_info"]["video_size"], 2048);
        assert_eq!(body["source_info"]["chunk_size"], 2048);
        assert_eq!(body["source_info"]["total_chunk_count"], 1);
    }

    #[test]
    fn test_title_capped() {
        let caption = "é".repeat(400);
        assert_eq!(title_for(&caption).chars().count(), 150);
        assert_eq!(title_for("short"), "short");
    }

    #[test]
    fn test_init_error_status() {
        let parsed: InitResponse = serde_json::from_str(
            r#"{"error":{"code":"spam_risk_too_many_posts","message":"daily cap","log_id":"x"}}"#,
        )
        .unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.error.unwrap().code, "spam_risk_too_many_posts");
    }
}
