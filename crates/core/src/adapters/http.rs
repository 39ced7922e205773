//! HTTP plumbing shared by the platform adapters.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::PublishError;
use super::types::{PreparedMedia, PreparedPost};
use crate::formats::Platform;

const MAX_ERROR_BODY_CHARS: usize = 500;

pub(crate) fn build_client(platform: Platform, timeout: Duration) -> Result<Client, PublishError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PublishError::transport(platform, e))
}

/// Turns a non-success response into a [`PublishError`] carrying the status.
pub(crate) async fn check(platform: Platform, response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    debug!("{} responded {}", platform, status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = summarize_error_body(&body);
    let message = match status {
        StatusCode::UNAUTHORIZED => format!("authentication rejected: {}", detail),
        StatusCode::TOO_MANY_REQUESTS => format!("rate limited by platform: {}", detail),
        _ => detail,
    };
    Err(PublishError::http(platform, status.as_u16(), message))
}

/// Checks the status and decodes a JSON body.
pub(crate) async fn json<T: DeserializeOwned>(
    platform: Platform,
    response: Response,
) -> Result<T, PublishError> {
    let response = check(platform, response).await?;
    response
        .json()
        .await
        .map_err(|e| PublishError::unexpected(platform, format!("failed to parse body: {}", e)))
}

pub(crate) async fn read_media(platform: Platform, path: &Path) -> Result<Vec<u8>, PublishError> {
    tokio::fs::read(path).await.map_err(|e| {
        PublishError::new(
            platform,
            format!("failed to read {}: {}", path.display(), e),
        )
    })
}

pub(crate) fn require_media(
    platform: Platform,
    post: &PreparedPost,
) -> Result<&PreparedMedia, PublishError> {
    post.media
        .as_ref()
        .ok_or_else(|| PublishError::unsupported(platform, "text-only posts"))
}

pub(crate) fn require_video(
    platform: Platform,
    post: &PreparedPost,
) -> Result<&PreparedMedia, PublishError> {
    let media = require_media(platform, post)?;
    if !media.is_video() {
        return Err(PublishError::unsupported(platform, "image posts"));
    }
    Ok(media)
}

/// Extracts a human-readable message from a vendor error body.
///
/// Understands the Graph/Google `{"error": {"message"}}` shape, Twitter's
/// `detail` and `errors[]`, and LinkedIn's top-level `message`. Anything
/// else is returned verbatim, truncated.
pub(crate) fn summarize_error_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.pointer("/error/message"),
            value.pointer("/detail"),
            value.pointer("/errors/0/message"),
            value.pointer("/message"),
            value.pointer("/error_description"),
        ];
        if let Some(msg) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        let mut short: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        short.push_str("...");
        return short;
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_graph_error() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        assert_eq!(summarize_error_body(body), "Invalid OAuth access token.");
    }

    #[test]
    fn test_summarize_twitter_errors() {
        assert_eq!(
            summarize_error_body(r#"{"title":"Forbidden","detail":"You are not permitted"}"#),
            "You are not permitted"
        );
        assert_eq!(
            summarize_error_body(r#"{"errors":[{"code":187,"message":"Status is a duplicate."}]}"#),
            "Status is a duplicate."
        );
    }

    #[test]
    fn test_summarize_plain_and_empty() {
        assert_eq!(summarize_error_body("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(summarize_error_body(""), "empty response body");

        let long = "x".repeat(2000);
        let summary = summarize_error_body(&long);
        assert_eq!(summary.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_require_video_rejects_images_and_text() {
        let text = PreparedPost::text(crate::formats::PostType::Video, "hi");
        assert!(require_video(Platform::Tiktok, &text).is_err());

        let image = PreparedPost::text(crate::formats::PostType::Video, "hi").with_media(
            PreparedMedia {
                path: "/tmp/a.jpg".into(),
                kind: crate::converter::MediaKind::Image,
                width: 1080,
                height: 1080,
                duration_secs: None,
                size_bytes: 10,
                public_url: None,
                thumbnail: None,
            },
        );
        let err = require_video(Platform::Tiktok, &image).unwrap_err();
        assert!(err.message.contains("image"));
    }
}
