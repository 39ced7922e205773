//! LinkedIn adapter (UGC API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::config::LinkedinConfig;
use super::error::PublishError;
use super::http;
use super::traits::PlatformAdapter;
use super::types::{PreparedMedia, PreparedPost, PublishReceipt};
use crate::formats::Platform;

const DEFAULT_BASE_URL: &str = "https://api.linkedin.com/v2";
const PLATFORM: Platform = Platform::Linkedin;
const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

/// Publishes member shares through `ugcPosts`.
pub struct LinkedinAdapter {
    client: Client,
    base_url: String,
    access_token: String,
    person_urn: String,
}

/// Upload slot returned by `registerUpload`.
#[derive(Debug, PartialEq)]
struct RegisteredUpload {
    upload_url: String,
    asset: String,
}

impl LinkedinAdapter {
    pub fn new(config: LinkedinConfig, timeout: Duration) -> Result<Self, PublishError> {
        if config.access_token.is_empty() || config.person_urn.is_empty() {
            return Err(PublishError::new(
                PLATFORM,
                "access_token and person_urn are required",
            ));
        }

        Ok(Self {
            client: http::build_client(PLATFORM, timeout)?,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token: config.access_token,
            person_urn: config.person_urn,
        })
    }

    async fn upload(&self, media: &PreparedMedia) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/assets", self.base_url))
            .query(&[("action", "registerUpload")])
            .bearer_auth(&self.access_token)
            .json(&register_upload_body(&self.person_urn, media.is_video()))
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let registered = parse_registered_upload(&http::json::<Value>(PLATFORM, response).await?)?;
        debug!("LinkedIn upload registered: asset={}", registered.asset);

        let bytes = http::read_media(PLATFORM, &media.path).await?;
        let response = self
            .client
            .put(&registered.upload_url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, media.mime_type())
            .body(bytes)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        http::check(PLATFORM, response).await?;

        Ok(registered.asset)
    }
}

fn register_upload_body(owner: &str, video: bool) -> Value {
    let recipe = if video {
        "urn:li:digitalmediaRecipe:feedshare-video"
    } else {
        "urn:li:digitalmediaRecipe:feedshare-image"
    };
    json!({
        "registerUploadRequest": {
            "recipes": [recipe],
            "owner": owner,
            "serviceRelationships": [{
                "relationshipType": "OWNER",
                "identifier": "urn:li:userGeneratedContent"
            }]
        }
    })
}

fn parse_registered_upload(body: &Value) -> Result<RegisteredUpload, PublishError> {
    let upload_url = body
        .pointer("/value/uploadMechanism")
        .and_then(|m| m.get(UPLOAD_MECHANISM))
        .and_then(|m| m.get("uploadUrl"))
        .and_then(|u| u.as_str());
    let asset = body.pointer("/value/asset").and_then(|a| a.as_str());

    match (upload_url, asset) {
        (Some(upload_url), Some(asset)) => Ok(RegisteredUpload {
            upload_url: upload_url.to_string(),
            asset: asset.to_string(),
        }),
        _ => Err(PublishError::unexpected(
            PLATFORM,
            "registerUpload response without uploadUrl or asset",
        )),
    }
}

/// `media` is `(asset urn, is_video)` when the share carries an upload.
fn ugc_post_body(author: &str, text: &str, media: Option<(&str, bool)>) -> Value {
    let mut content = json!({
        "shareCommentary": { "text": text },
        "shareMediaCategory": "NONE",
    });
    if let Some((asset, video)) = media {
        content["shareMediaCategory"] = json!(if video { "VIDEO" } else { "IMAGE" });
        content["media"] = json!([{ "status": "READY", "media": asset }]);
    }

    json!({
        "author": author,
        "lifecycleState": "PUBLISHED",
        "specificContent": { "com.linkedin.ugc.ShareContent": content },
        "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }
    })
}

fn share_url(urn: &str) -> String {
    format!(
        "https://www.linkedin.com/feed/update/{}",
        urlencoding::encode(urn)
    )
}

#[async_trait]
impl PlatformAdapter for LinkedinAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let asset = match &post.media {
            Some(media) => Some((self.upload(media).await?, media.is_video())),
            None => None,
        };

        let body = ugc_post_body(
            &self.person_urn,
            &post.caption,
            asset.as_ref().map(|(a, video)| (a.as_str(), *video)),
        );
        let response = self
            .client
            .post(format!("{}/ugcPosts", self.base_url))
            .bearer_auth(&self.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::transport(PLATFORM, e))?;
        let response = http::check(PLATFORM, response).await?;

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let remote_id = match header_id {
            Some(id) => id,
            None => {
                let created: Value = response.json().await.map_err(|e| {
                    PublishError::unexpected(PLATFORM, format!("failed to parse body: {}", e))
                })?;
                created
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| PublishError::unexpected(PLATFORM, "ugcPosts response without id"))?
            }
        };

        info!("Published LinkedIn share {}", remote_id);
        let url = share_url(&remote_id);
        Ok(PublishReceipt::new(remote_id, Some(url)))
    }
}
