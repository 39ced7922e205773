//! Twitter/X adapter.
//!
//! Images go up in one request; videos use the INIT/APPEND/FINALIZE
//! chunked protocol and may need a STATUS poll before they can be attached.
//! The tweet itself is created through `POST /2/tweets`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::config::TwitterConfig;
use super::error::PublishError;
use super::http;
use super::traits::PlatformAdapter;
use super::types::{PreparedMedia, PreparedPost, PublishReceipt};
use crate::formats::Platform;

const DEFAULT_BASE_URL: &str = "https://api.x.com/2";
const DEFAULT_UPLOAD_URL: &str = "https://api.x.com/2/media/upload";
const PLATFORM: Platform = Platform::Twitter;
const MAX_STATUS_POLLS: u32 = 30;

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// Server-side processing state of an uploaded video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    check_after_secs: Option<u64>,
    #[serde(default)]
    error: Option<Value>,
}

/// Publishes tweets with an OAuth 2.0 user-context token.
pub struct TwitterAdapter {
    client: Client,
    base_url: String,
    upload_url: String,
    access_token: String,
    chunk_size: usize,
}

impl TwitterAdapter {
    pub fn new(config: TwitterConfig, timeout: Duration) -> Result<Self, PublishError> {
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
            upload_url: config
                .upload_url
                .unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            access_token: config.access_token,
            chunk_size: config.chunk_size_bytes,
        })
    }

    async fn upload_json(&self, request: reqwest::RequestBuilder) -> Result<Value, PublishError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        http::json(PLATFORM, response).await
    }

    async fn upload_image(&self, media: &PreparedMedia) -> Result<String, PublishError> {
        let bytes = http::read_media(PLATFORM, &media.path).await?;
        let part = Part::bytes(bytes)
            .file_name(media.file_name())
            .mime_str(media.mime_type())
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let form = Form::new()
            .text("media_category", "tweet_image")
            .part("media", part);

        let body = self
            .upload_json(self.client.post(&self.upload_url).multipart(form))
            .await?;
        media_id_from(&body)
    }

    async fn upload_video(&self, media: &PreparedMedia) -> Result<String, PublishError> {
        let bytes = http::read_media(PLATFORM, &media.path).await?;
        let total = bytes.len().to_string();

        let init = self
            .upload_json(self.client.post(&self.upload_url).form(&[
                ("command", "INIT"),
                ("total_bytes", total.as_str()),
                ("media_type", media.mime_type()),
                ("media_category", "tweet_video"),
            ]))
            .await?;
        let media_id = media_id_from(&init)?;
        debug!("Twitter upload INIT media_id={} bytes={}", media_id, total);

        for (index, chunk) in bytes.chunks(self.chunk_size).enumerate() {
            let form = Form::new()
                .text("command", "APPEND")
                .text("media_id", media_id.clone())
                .text("segment_index", index.to_string())
                .part(
                    "media",
                    Part::bytes(chunk.to_vec()).file_name(media.file_name()),
                );
            let response = self
                .client
                .post(&self.upload_url)
                .bearer_auth(&self.access_token)
                .multipart(form)
                .send()
                .await
                .map_err(|e| PublishError::transport(PLATFORM, e))?;
            http::check(PLATFORM, response).await?;
            debug!("Twitter upload APPEND segment {}", index);
        }

        let finalized = self
            .upload_json(
                self.client
                    .post(&self.upload_url)
                    .form(&[("command", "FINALIZE"), ("media_id", media_id.as_str())]),
            )
            .await?;

        let mut processing = processing_info(&finalized);
        let mut polls = 0;
        while let Some(info) = processing {
            match info.state.as_str() {
                "succeeded" => break,
                "failed" => {
                    let reason = info
                        .error
                        .as_ref()
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .unwrap_or("unknown error");
                    return Err(PublishError::new(
                        PLATFORM,
                        format!("video processing failed: {}", reason),
                    ));
                }
                _ => {}
            }

            polls += 1;
            if polls > MAX_STATUS_POLLS {
                return Err(PublishError::new(
                    PLATFORM,
                    "video processing did not finish in time",
                ));
            }

            let wait = info.check_after_secs.unwrap_or(1).max(1);
            debug!("Twitter media {} is {}, polling in {}s", media_id, info.state, wait);
            tokio::time::sleep(Duration::from_secs(wait)).await;

            let status = self
                .upload_json(
                    self.client
                        .get(&self.upload_url)
                        .query(&[("command", "STATUS"), ("media_id", media_id.as_str())]),
                )
                .await?;
            processing = processing_info(&status);
        }

        Ok(media_id)
    }
}

/// Media id from either the v1.1 (`media_id_string`) or v2 (`data.id`) shape.
fn media_id_from(body: &Value) -> Result<String, PublishError> {
    body.get("media_id_string")
        .or_else(|| body.pointer("/data/id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| body.get("media_id").and_then(|v| v.as_u64()).map(|n| n.to_string()))
        .ok_or_else(|| PublishError::unexpected(PLATFORM, "upload response without media id"))
}

fn processing_info(body: &Value) -> Option<ProcessingInfo> {
    body.get("processing_info")
        .or_else(|| body.pointer("/data/processing_info"))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn tweet_body(text: &str, media_id: Option<&str>) -> Value {
    match media_id {
        Some(id) => json!({ "text": text, "media": { "media_ids": [id] } }),
        None => json!({ "text": text }),
    }
}

fn tweet_url(id: &str) -> String {
    format!("https://twitter.com/i/web/status/{}", id)
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let media_id = match &post.media {
            Some(media) if media.is_video() => Some(self.upload_video(media).await?),
            Some(media) => Some(self.upload_image(media).await?),
            None => None,
        };

        let response = self
            .client
            .post(format!("{}/tweets", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&tweet_body(&post.caption, media_id.as_deref()))
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let tweet: TweetResponse = http::json(PLATFORM, response).await?;

        info!("Published tweet {}", tweet.data.id);
        let url = tweet_url(&tweet.data.id);
        Ok(PublishReceipt::new(tweet.data.id, Some(url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_id_shapes() {
        let v1: Value = serde_json::from_str(
            r#"{"media_id":710511363345354753,"media_id_string":"710511363345354753"}"#,
        )
        .unwrap();
        assert_eq!(media_id_from(&v1).unwrap(), "710511363345354753");

        let v2: Value = serde_json::from_str(r#"{"data":{"id":"1880028106020515840"}}"#).unwrap();
        assert_eq!(media_id_from(&v2).unwrap(), "1880028106020515840");

        let numeric: Value = serde_json::from_str(r#"{"media_id":42}"#).unwrap();
        assert_eq!(media_id_from(&numeric).unwrap(), "42");

        assert!(media_id_from(&json!({})).is_err());
    }

    #[test]
    fn test_processing_info() {
        let pending: Value = serde_json::from_str(
            r#"{"media_id_string":"1","processing_info":{"state":"pending","check_after_secs":5}}"#,
        )
        .unwrap();
        let info = processing_info(&pending).unwrap();
        assert_eq!(info.state, "pending");
        assert_eq!(info.check_after_secs, Some(5));

        let done: Value = serde_json::from_str(r#"{"media_id_string":"1"}"#).unwrap();
        assert!(processing_info(&done).is_none());
    }

    #[test]
    fn test_tweet_body() {
        assert_eq!(tweet_body("hi", None), json!({"text": "hi"}));
        assert_eq!(
            tweet_body("hi", Some("99")),
            json!({"text": "hi", "media": {"media_ids": ["99"]}})
        );
        assert_eq!(tweet_url("5"), "https://twitter.com/i/web/status/5");
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let config = TwitterConfig {
            access_token: "t".to_string(),
            base_url: None,
            upload_url: None,
            chunk_size_bytes: 0,
        };
        assert!(TwitterAdapter::new(config, Duration::from_secs(1)).is_err());
    }
}
