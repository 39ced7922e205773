//! Instagram adapter (Graph API, container based).
//!
//! Instagram fetches media itself, so every post needs a public URL. A
//! container is created, given a grace period to ingest, then published.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::config::InstagramConfig;
use super::error::PublishError;
use super::http;
use super::traits::PlatformAdapter;
use super::types::{PreparedMedia, PreparedPost, PublishReceipt};
use crate::formats::{Platform, PostType};

const DEFAULT_BASE_URL: &str = "https://graph.instagram.com/v18.0";
const PLATFORM: Platform = Platform::Instagram;

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    #[serde(default)]
    permalink: Option<String>,
}

/// Publishes to an Instagram professional account.
pub struct InstagramAdapter {
    client: Client,
    base_url: String,
    user_id: String,
    access_token: String,
    video_grace: Duration,
    image_grace: Duration,
}

impl InstagramAdapter {
    pub fn new(config: InstagramConfig, timeout: Duration) -> Result<Self, PublishError> {
        if config.user_id.is_empty() || config.access_token.is_empty() {
            return Err(PublishError::new(
                PLATFORM,
                "user_id and access_token are required",
            ));
        }

        Ok(Self {
            client: http::build_client(PLATFORM, timeout)?,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            user_id: config.user_id,
            access_token: config.access_token,
            video_grace: Duration::from_secs(config.video_grace_secs),
            image_grace: Duration::from_secs(config.image_grace_secs),
        })
    }

    async fn create_container(&self, body: &Value) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/{}/media", self.base_url, self.user_id))
            .json(body)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let created: IdResponse = http::json(PLATFORM, response).await?;
        Ok(created.id)
    }

    async fn publish_container(&self, creation_id: &str) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/{}/media_publish", self.base_url, self.user_id))
            .json(&json!({
                "access_token": self.access_token,
                "creation_id": creation_id,
            }))
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let published: IdResponse = http::json(PLATFORM, response).await?;
        Ok(published.id)
    }

    /// Best effort; a missing permalink does not fail the publish.
    async fn permalink(&self, media_id: &str) -> Option<String> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, media_id))
            .query(&[("fields", "permalink"), ("access_token", self.access_token.as_str())])
            .send()
            .await
            .ok()?;
        match http::json::<PermalinkResponse>(PLATFORM, response).await {
            Ok(found) => found.permalink,
            Err(e) => {
                debug!("Instagram permalink lookup failed: {}", e);
                None
            }
        }
    }
}

/// Container creation body for a post type and media kind.
fn container_body(
    post_type: PostType,
    media: &PreparedMedia,
    public_url: &str,
    caption: &str,
    access_token: &str,
) -> Value {
    let mut body = json!({ "access_token": access_token });

    if media.is_video() {
        body["video_url"] = json!(public_url);
        body["media_type"] = match post_type {
            PostType::Story => json!("STORIES"),
            _ => json!("REELS"),
        };
        if post_type == PostType::Reel {
            body["share_to_feed"] = json!(true);
        }
    } else {
        body["image_url"] = json!(public_url);
        if post_type == PostType::Story {
            body["media_type"] = json!("STORIES");
        }
    }

    // Stories carry no caption.
    if post_type != PostType::Story {
        body["caption"] = json!(caption);
    }

    body
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    fn needs_public_url(&self) -> bool {
        true
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let media = http::require_media(PLATFORM, post)?;
        let public_url = media.public_url.as_deref().ok_or_else(|| {
            PublishError::new(PLATFORM, "a public media URL is required")
        })?;

        let body = container_body(
            post.post_type,
            media,
            public_url,
            &post.caption,
            &self.access_token,
        );
        let creation_id = self.create_container(&body).await?;

        let grace = if media.is_video() {
            self.video_grace
        } else {
            self.image_grace
        };
        debug!(
            "Instagram container {} created, waiting {:?} before publish",
            creation_id, grace
        );
        if !grace.is_zero() {
            tokio::time::sleep(grace).await;
        }

        let media_id = self.publish_container(&creation_id).await?;
        let remote_url = self.permalink(&media_id).await;

        info!("Published to Instagram {}: {}", self.user_id, media_id);
        Ok(PublishReceipt::new(media_id, remote_url))
    }
}
