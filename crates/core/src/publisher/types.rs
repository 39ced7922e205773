//! Publish request and result types.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::adapters::PublishReceipt;
use crate::converter::CropStrategy;
use crate::formats::{Platform, PostType};

/// Where the media for a batch comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// Remote file, downloaded into the batch workspace.
    Url(String),
    /// Local file owned by the caller; never deleted.
    Path(PathBuf),
}

impl MediaSource {
    /// Remote URL, if the source is one.
    pub fn url(&self) -> Option<&str> {
        match self {
            MediaSource::Url(url) => Some(url),
            MediaSource::Path(_) => None,
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Url(url) => write!(f, "{}", url),
            MediaSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Caption text produced upstream, before per-platform formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionDraft {
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Title for platforms that take one (YouTube).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CaptionDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// One publish batch: a caption, optional media and an ordered platform list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Caption used for platforms without an override.
    pub caption: CaptionDraft,
    /// Per-platform caption overrides.
    #[serde(default)]
    pub captions: HashMap<Platform, CaptionDraft>,
    #[serde(default)]
    pub media: Option<MediaSource>,
    /// Target platforms, published strictly in this order.
    pub platforms: Vec<Platform>,
    /// Per-platform post type overrides.
    #[serde(default)]
    pub post_types: HashMap<Platform, PostType>,
    /// Ratio fitting; the publisher default applies when unset.
    #[serde(default)]
    pub crop_strategy: Option<CropStrategy>,
}

impl PublishRequest {
    pub fn new(caption: CaptionDraft, platforms: Vec<Platform>) -> Self {
        Self {
            caption,
            captions: HashMap::new(),
            media: None,
            platforms,
            post_types: HashMap::new(),
            crop_strategy: None,
        }
    }

    pub fn with_media(mut self, media: MediaSource) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_caption_for(mut self, platform: Platform, caption: CaptionDraft) -> Self {
        self.captions.insert(platform, caption);
        self
    }

    pub fn with_post_type(mut self, platform: Platform, post_type: PostType) -> Self {
        self.post_types.insert(platform, post_type);
        self
    }

    pub fn with_crop_strategy(mut self, strategy: CropStrategy) -> Self {
        self.crop_strategy = Some(strategy);
        self
    }

    pub fn caption_for(&self, platform: Platform) -> &CaptionDraft {
        self.captions.get(&platform).unwrap_or(&self.caption)
    }
}

/// Where an attempt is in its lifecycle.
///
/// ```text
/// Pending -> RateChecked -> Formatted -> Moderated -> Dispatched -> Succeeded
///    \___________\______________\___________\____________\______-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Pending,
    RateChecked,
    Formatted,
    Moderated,
    Dispatched,
    Succeeded,
    Failed,
}

impl AttemptState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptState::Pending => "pending",
            AttemptState::RateChecked => "rate_checked",
            AttemptState::Formatted => "formatted",
            AttemptState::Moderated => "moderated",
            AttemptState::Dispatched => "dispatched",
            AttemptState::Succeeded => "succeeded",
            AttemptState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Succeeded | AttemptState::Failed)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one platform in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishAttemptResult {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostType>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Last state reached before failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<AttemptState>,
}

impl PublishAttemptResult {
    pub fn succeeded(platform: Platform, post_type: PostType, receipt: PublishReceipt) -> Self {
        Self {
            platform,
            post_type: Some(post_type),
            success: true,
            remote_id: Some(receipt.remote_id),
            remote_url: receipt.remote_url,
            error_message: None,
            failed_at: None,
        }
    }

    pub fn failed(
        platform: Platform,
        post_type: Option<PostType>,
        state: AttemptState,
        message: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            post_type,
            success: false,
            remote_id: None,
            remote_url: None,
            error_message: Some(message.into()),
            failed_at: Some(state),
        }
    }
}

/// Aggregated outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishBatchResult {
    pub batch_id: String,
    pub attempts: Vec<PublishAttemptResult>,
    /// True only when there was at least one attempt and all succeeded.
    pub overall_success: bool,
}

impl PublishBatchResult {
    pub fn from_attempts(batch_id: impl Into<String>, attempts: Vec<PublishAttemptResult>) -> Self {
        let overall_success = !attempts.is_empty() && attempts.iter().all(|a| a.success);
        Self {
            batch_id: batch_id.into(),
            attempts,
            overall_success,
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.attempts.len() - self.succeeded_count()
    }

    pub fn attempt(&self, platform: Platform) -> Option<&PublishAttemptResult> {
        self.attempts.iter().find(|a| a.platform == platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_success_requires_attempts() {
        assert!(!PublishBatchResult::from_attempts("b", vec![]).overall_success);

        let ok = PublishAttemptResult::succeeded(
            Platform::Twitter,
            PostType::Tweet,
            PublishReceipt::new("1", None),
        );
        let failed = PublishAttemptResult::failed(
            Platform::Facebook,
            None,
            AttemptState::Pending,
            "rate limit exceeded",
        );

        let all_ok = PublishBatchResult::from_attempts("b", vec![ok.clone()]);
        assert!(all_ok.overall_success);

        let mixed = PublishBatchResult::from_attempts("b", vec![ok, failed]);
        assert!(!mixed.overall_success);
        assert_eq!(mixed.succeeded_count(), 1);
        assert_eq!(mixed.failed_count(), 1);
        assert_eq!(
            mixed.attempt(Platform::Facebook).unwrap().failed_at,
            Some(AttemptState::Pending)
        );
    }

    #[test]
    fn test_request_from_json() {
        let request: PublishRequest = serde_json::from_str(
            r#"{
                "caption": {"text": "hello", "hashtags": ["rust"]},
                "captions": {"twitter": {"text": "short hello"}},
                "media": {"url": "https://cdn.example.com/clip.mp4"},
                "platforms": ["facebook", "twitter", "youtube"],
                "post_types": {"facebook": "reel"},
                "crop_strategy": "pad"
            }"#,
        )
        .unwrap();

        assert_eq!(request.platforms.len(), 3);
        assert_eq!(request.caption_for(Platform::Twitter).text, "short hello");
        assert_eq!(request.caption_for(Platform::Youtube).text, "hello");
        assert_eq!(
            request.media.as_ref().and_then(|m| m.url()),
            Some("https://cdn.example.com/clip.mp4")
        );
        assert_eq!(request.post_types.get(&Platform::Facebook), Some(&PostType::Reel));
        assert_eq!(request.crop_strategy, Some(CropStrategy::Pad));
    }

    #[test]
    fn test_attempt_result_json_omits_empty_fields() {
        let ok = PublishAttemptResult::succeeded(
            Platform::Linkedin,
            PostType::Post,
            PublishReceipt::new("urn:li:share:1", None),
        );
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["platform"], "linkedin");
        assert_eq!(json["post_type"], "post");
        assert!(json.get("error_message").is_none());
        assert!(json.get("failed_at").is_none());
    }
}
