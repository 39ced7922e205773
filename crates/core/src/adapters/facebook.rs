//! Facebook page adapter (Graph API).
//!
//! Text goes to `/feed`, photos to `/photos`, regular videos to `/videos`
//! and reels through the three-phase `/video_reels` upload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::config::FacebookConfig;
use super::error::PublishError;
use super::http;
use super::traits::PlatformAdapter;
use super::types::{PreparedMedia, PreparedPost, PublishReceipt};
use crate::formats::{Platform, PostType};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v18.0";
const PLATFORM: Platform = Platform::Facebook;

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
    #[serde(default)]
    post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReelStartResponse {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    #[serde(default)]
    success: bool,
}

/// Publishes to a Facebook page.
pub struct FacebookAdapter {
    client: Client,
    base_url: String,
    page_id: String,
    access_token: String,
}

impl FacebookAdapter {
    pub fn new(config: FacebookConfig, timeout: Duration) -> Result<Self, PublishError> {
        if config.page_id.is_empty() || config.access_token.is_empty() {
            return Err(PublishError::new(
                PLATFORM,
                "page_id and access_token are required",
            ));
        }

        Ok(Self {
            client: http::build_client(PLATFORM, timeout)?,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            page_id: config.page_id,
            access_token: config.access_token,
        })
    }

    fn edge_url(&self, edge: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.page_id, edge)
    }

    async fn media_part(media: &PreparedMedia) -> Result<Part, PublishError> {
        let bytes = http::read_media(PLATFORM, &media.path).await?;
        Part::bytes(bytes)
            .file_name(media.file_name())
            .mime_str(media.mime_type())
            .map_err(|e| PublishError::transport(PLATFORM, e))
    }

    async fn publish_text(&self, caption: &str) -> Result<PublishReceipt, PublishError> {
        let response = self
            .client
            .post(self.edge_url("feed"))
            .form(&[("message", caption), ("access_token", self.access_token.as_str())])
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;

        let created: IdResponse = http::json(PLATFORM, response).await?;
        let url = post_url(&created.id);
        Ok(PublishReceipt::new(created.id, Some(url)))
    }

    async fn publish_photo(
        &self,
        media: &PreparedMedia,
        caption: &str,
    ) -> Result<PublishReceipt, PublishError> {
        let form = Form::new()
            .text("message", caption.to_string())
            .part("source", Self::media_part(media).await?);

        let response = self
            .client
            .post(self.edge_url("photos"))
            .query(&[("access_token", &self.access_token)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;

        let created: IdResponse = http::json(PLATFORM, response).await?;
        let remote_id = created.post_id.unwrap_or(created.id);
        let url = post_url(&remote_id);
        Ok(PublishReceipt::new(remote_id, Some(url)))
    }

    async fn publish_video(
        &self,
        media: &PreparedMedia,
        caption: &str,
    ) -> Result<PublishReceipt, PublishError> {
        let form = Form::new()
            .text("description", caption.to_string())
            .part("source", Self::media_part(media).await?);

        let response = self
            .client
            .post(self.edge_url("videos"))
            .query(&[("access_token", &self.access_token)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;

        let created: IdResponse = http::json(PLATFORM, response).await?;
        let url = video_url(&self.page_id, &created.id);
        Ok(PublishReceipt::new(created.id, Some(url)))
    }

    async fn publish_reel(
        &self,
        media: &PreparedMedia,
        caption: &str,
    ) -> Result<PublishReceipt, PublishError> {
        let url = self.edge_url("video_reels");

        debug!("Facebook reel upload: start");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("upload_phase", "start"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let started: ReelStartResponse = http::json(PLATFORM, response).await?;

        debug!("Facebook reel upload: transfer video_id={}", started.video_id);
        let form = Form::new()
            .text("upload_phase", "transfer")
            .text("video_id", started.video_id.clone())
            .text("access_token", self.access_token.clone())
            .part("video_file_chunk", Self::media_part(media).await?);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        http::check(PLATFORM, response).await?;

        debug!("Facebook reel upload: finish video_id={}", started.video_id);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("upload_phase", "finish"),
                ("video_id", started.video_id.as_str()),
                ("video_state", "PUBLISHED"),
                ("description", caption),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let finished: SuccessResponse = http::json(PLATFORM, response).await?;
        if !finished.success {
            return Err(PublishError::unexpected(
                PLATFORM,
                "reel finish phase did not report success",
            ));
        }

        let remote_url = video_url(&self.page_id, &started.video_id);
        Ok(PublishReceipt::new(started.video_id, Some(remote_url)))
    }
}

fn post_url(id: &str) -> String {
    format!("https://www.facebook.com/{}", id)
}

fn video_url(page_id: &str, video_id: &str) -> String {
    format!("https://www.facebook.com/{}/videos/{}", page_id, video_id)
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let receipt = match (&post.media, post.post_type) {
            (None, _) => self.publish_text(&post.caption).await?,
            (Some(media), PostType::Reel) if media.is_video() => {
                self.publish_reel(media, &post.caption).await?
            }
            (Some(media), _) if media.is_video() => {
                self.publish_video(media, &post.caption).await?
            }
            (Some(media), _) => self.publish_photo(media, &post.caption).await?,
        };

        info!(
            "Published to Facebook page {}: {}",
            self.page_id, receipt.remote_id
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FacebookConfig {
        FacebookConfig {
            page_id: "1234".to_string(),
            access_token: "token".to_string(),
            base_url: Some("http://localhost:9999/v18.0/".to_string()),
        }
    }

    #[test]
    fn test_requires_credentials() {
        let mut cfg = config();
        cfg.access_token.clear();
        assert!(FacebookAdapter::new(cfg, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_edge_url_trims_trailing_slash() {
        let adapter = FacebookAdapter::new(config(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            adapter.edge_url("video_reels"),
            "http://localhost:9999/v18.0/1234/video_reels"
        );
    }

    #[test]
    fn test_remote_urls() {
        assert_eq!(
            video_url("1234", "987"),
            "https://www.facebook.com/1234/videos/987"
        );
        assert_eq!(post_url("1234_55"), "https://www.facebook.com/1234_55");
    }

    #[test]
    fn test_photo_response_prefers_post_id() {
        let parsed: IdResponse =
            serde_json::from_str(r#"{"id":"555","post_id":"1234_555"}"#).unwrap();
        assert_eq!(parsed.post_id.as_deref(), Some("1234_555"));

        let parsed: IdResponse = serde_json::from_str(r#"{"id":"777"}"#).unwrap();
        assert!(parsed.post_id.is_none());
    }
}
