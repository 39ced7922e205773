//! Google Cloud Vision SafeSearch classifier.
//!
//! Sends the image inline (base64) to `images:annotate` with a single
//! `SAFE_SEARCH_DETECTION` feature and maps the annotation onto
//! [`SafetyAnnotation`].

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::error::ModerationError;
use super::traits::ImageClassifier;
use super::types::SafetyAnnotation;

/// Google Vision client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// API key with the Cloud Vision API enabled.
    pub api_key: String,
    /// Base URL (default: https://vision.googleapis.com/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

/// SafeSearch classifier backed by the Vision REST API.
pub struct VisionClassifier {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisionClassifier {
    pub fn new(config: VisionConfig) -> Result<Self, ModerationError> {
        if config.api_key.is_empty() {
            return Err(ModerationError::NotConfigured(
                "Google Vision API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .unwrap_or_else(|| "https://vision.googleapis.com/v1".to_string()),
            api_key: config.api_key,
        })
    }

    fn build_request(image: &[u8]) -> serde_json::Value {
        serde_json::json!({
            "requests": [{
                "image": { "content": base64::engine::general_purpose::STANDARD.encode(image) },
                "features": [{ "type": "SAFE_SEARCH_DETECTION" }]
            }]
        })
    }

    fn parse_response(body: &str) -> Result<SafetyAnnotation, ModerationError> {
        #[derive(Deserialize)]
        struct AnnotateResponse {
            #[serde(default)]
            responses: Vec<ImageResponse>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ImageResponse {
            safe_search_annotation: Option<SafetyAnnotation>,
            error: Option<ResponseError>,
        }

        #[derive(Deserialize)]
        struct ResponseError {
            #[serde(default)]
            code: u16,
            #[serde(default)]
            message: String,
        }

        let parsed: AnnotateResponse = serde_json::from_str(body).map_err(|e| {
            ModerationError::ParseError(format!("Failed to parse SafeSearch response: {}", e))
        })?;

        let first = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ModerationError::ParseError("empty responses array".to_string()))?;

        if let Some(err) = first.error {
            return Err(ModerationError::ApiError {
                status: err.code,
                message: err.message,
            });
        }

        first
            .safe_search_annotation
            .ok_or_else(|| ModerationError::ParseError("missing safeSearchAnnotation".to_string()))
    }
}

#[async_trait]
impl ImageClassifier for VisionClassifier {
    fn name(&self) -> &str {
        "google_vision"
    }

    async fn classify(&self, path: &Path) -> Result<SafetyAnnotation, ModerationError> {
        let image = tokio::fs::read(path).await?;
        let url = format!("{}/images:annotate", self.base_url);

        debug!("SafeSearch request: path={}, bytes={}", path.display(), image.len());

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&Self::build_request(&image))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ModerationError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Self::parse_response(&body)
    }
}
