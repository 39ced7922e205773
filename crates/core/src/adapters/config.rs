//! Per-platform credentials and endpoints.
//!
//! OAuth flows live outside this crate: every token here is an already
//! issued access token.

use serde::{Deserialize, Serialize};

use crate::formats::Platform;

fn default_http_timeout_secs() -> u64 {
    300
}

/// Credentials for every platform the publisher may target.
///
/// A platform without a section is simply not registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    /// Timeout for a single platform HTTP request, uploads included.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub facebook: Option<FacebookConfig>,
    #[serde(default)]
    pub instagram: Option<InstagramConfig>,
    #[serde(default)]
    pub twitter: Option<TwitterConfig>,
    #[serde(default)]
    pub linkedin: Option<LinkedinConfig>,
    #[serde(default)]
    pub tiktok: Option<TiktokConfig>,
    #[serde(default)]
    pub youtube: Option<YoutubeConfig>,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            facebook: None,
            instagram: None,
            twitter: None,
            linkedin: None,
            tiktok: None,
            youtube: None,
        }
    }
}

impl PlatformsConfig {
    pub fn is_configured(&self, platform: Platform) -> bool {
        match platform {
            Platform::Facebook => self.facebook.is_some(),
            Platform::Instagram => self.instagram.is_some(),
            Platform::Twitter => self.twitter.is_some(),
            Platform::Linkedin => self.linkedin.is_some(),
            Platform::Tiktok => self.tiktok.is_some(),
            Platform::Youtube => self.youtube.is_some(),
        }
    }

    pub fn configured(&self) -> Vec<Platform> {
        Platform::ALL
            .iter()
            .copied()
            .filter(|p| self.is_configured(*p))
            .collect()
    }
}

/// Facebook page publishing via the Graph API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    pub page_id: String,
    /// Page access token.
    pub access_token: String,
    /// Graph API root (default: https://graph.facebook.com/v18.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_video_grace_secs() -> u64 {
    15
}

fn default_image_grace_secs() -> u64 {
    5
}

/// Instagram professional account publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    pub user_id: String,
    pub access_token: String,
    /// Graph API root (default: https://graph.instagram.com/v18.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Wait between creating a video container and publishing it.
    #[serde(default = "default_video_grace_secs")]
    pub video_grace_secs: u64,
    /// Wait between creating an image container and publishing it.
    #[serde(default = "default_image_grace_secs")]
    pub image_grace_secs: u64,
}

fn default_twitter_chunk_size() -> usize {
    4 * 1024 * 1024
}

/// Twitter/X publishing with an OAuth 2.0 user-context token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub access_token: String,
    /// API root (default: https://api.x.com/2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Media upload endpoint (default: https://api.x.com/2/media/upload).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    /// APPEND segment size for chunked video uploads.
    #[serde(default = "default_twitter_chunk_size")]
    pub chunk_size_bytes: usize,
}

/// LinkedIn member publishing via the UGC API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedinConfig {
    pub access_token: String,
    /// Author URN, e.g. `urn:li:person:abc123`.
    pub person_urn: String,
    /// API root (default: https://api.linkedin.com/v2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_tiktok_chunk_size() -> u64 {
    10 * 1024 * 1024
}

fn default_privacy_level() -> String {
    "PUBLIC_TO_EVERYONE".to_string()
}

/// TikTok Content Posting API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiktokConfig {
    pub access_token: String,
    /// API root (default: https://open.tiktokapis.com/v2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_privacy_level")]
    pub privacy_level: String,
    /// Files at least this large are uploaded in several chunks.
    #[serde(default = "default_tiktok_chunk_size")]
    pub chunk_size_bytes: u64,
}

fn default_category_id() -> String {
    "22".to_string()
}

fn default_privacy_status() -> String {
    "public".to_string()
}

/// YouTube Data API v3 uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    pub access_token: String,
    /// Upload API root (default: https://www.googleapis.com/upload/youtube/v3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_base_url: Option<String>,
    /// Video category (22 is "People & Blogs").
    #[serde(default = "default_category_id")]
    pub category_id: String,
    /// Privacy for `video` and `short` posts; `unlisted` posts override it.
    #[serde(default = "default_privacy_status")]
    pub privacy_status: String,
}
