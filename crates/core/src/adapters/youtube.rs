//! YouTube adapter (Data API v3 resumable upload).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::config::YoutubeConfig;
use super::error::PublishError;
use super::http;
use super::traits::PlatformAdapter;
use super::types::{PreparedPost, PublishReceipt};
use crate::formats::{Platform, PostType};

const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/youtube/v3";
const PLATFORM: Platform = Platform::Youtube;
const TITLE_MAX_CHARS: usize = 100;
const SHORTS_TAG: &str = " #shorts";

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// Uploads videos to a YouTube channel.
pub struct YoutubeAdapter {
    client: Client,
    upload_base_url: String,
    access_token: String,
    category_id: String,
    privacy_status: String,
}

impl YoutubeAdapter {
    pub fn new(config: YoutubeConfig, timeout: Duration) -> Result<Self, PublishError> {
        if config.access_token.is_empty() {
            return Err(PublishError::new(PLATFORM, "access_token is required"));
        }

        Ok(Self {
            client: http::build_client(PLATFORM, timeout)?,
            upload_base_url: config
                .upload_base_url
                .unwrap_or_else(|| DEFAULT_UPLOAD_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token: config.access_token,
            category_id: config.category_id,
            privacy_status: config.privacy_status,
        })
    }

    /// Thumbnail upload failures are logged and otherwise ignored.
    async fn set_thumbnail(&self, video_id: &str, path: &std::path::Path) {
        let bytes = match http::read_media(PLATFORM, path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping YouTube thumbnail for {}: {}", video_id, e);
                return;
            }
        };

        let result = self
            .client
            .post(format!("{}/thumbnails/set", self.upload_base_url))
            .query(&[("videoId", video_id)])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(bytes)
            .send()
            .await;

        match result {
            Ok(response) => {
                if let Err(e) = http::check(PLATFORM, response).await {
                    warn!("YouTube thumbnail rejected for {}: {}", video_id, e);
                }
            }
            Err(e) => warn!("YouTube thumbnail upload failed for {}: {}", video_id, e),
        }
    }
}

/// Title from an explicit title or the caption's first line, capped at 100
/// chars. Shorts get `#shorts` appended inside the cap.
fn video_title(title: Option<&str>, caption: &str, short: bool) -> String {
    let base = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| caption.lines().next().unwrap_or("").trim());

    if short {
        let room = TITLE_MAX_CHARS - SHORTS_TAG.chars().count();
        let mut title: String = base.chars().take(room).collect();
        title.push_str(SHORTS_TAG);
        title.trim_start().to_string()
    } else {
        base.chars().take(TITLE_MAX_CHARS).collect()
    }
}

fn video_metadata(
    post: &PreparedPost,
    category_id: &str,
    default_privacy: &str,
) -> Value {
    let short = post.post_type == PostType::Short;
    let privacy = if post.post_type == PostType::Unlisted {
        "unlisted"
    } else {
        default_privacy
    };

    json!({
        "snippet": {
            "title": video_title(post.title.as_deref(), &post.caption, short),
            "description": post.caption,
            "tags": post.hashtags,
            "categoryId": category_id
        },
        "status": {
            "privacyStatus": privacy,
            "selfDeclaredMadeForKids": false
        }
    })
}

fn watch_url(id: &str) -> String {
    format!("https://youtube.com/watch?v={}", id)
}

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let media = http::require_video(PLATFORM, post)?;
        let bytes = http::read_media(PLATFORM, &media.path).await?;

        let response = self
            .client
            .post(format!("{}/videos", self.upload_base_url))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", media.mime_type())
            .header("X-Upload-Content-Length", bytes.len().to_string())
            .json(&video_metadata(post, &self.category_id, &self.privacy_status))
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let response = http::check(PLATFORM, response).await?;

        let session_url = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::unexpected(PLATFORM, "resumable session without Location header")
            })?;
        debug!("YouTube upload session opened ({} bytes)", bytes.len());

        let response = self
            .client
            .put(&session_url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, media.mime_type())
            .body(bytes)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let video: VideoResource = http::json(PLATFORM, response).await?;

        if let Some(thumbnail) = &media.thumbnail {
            self.set_thumbnail(&video.id, thumbnail).await;
        }

        info!("Published YouTube video {}", video.id);
        let url = watch_url(&video.id);
        Ok(PublishReceipt::new(video.id, Some(url)))
    }
}
