//! Publisher error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::adapters::PublishError;
use crate::converter::ConverterError;
use crate::formats::{Platform, PostType};
use crate::history::StoreError;
use crate::moderation::{ModerationBlocked, UnsafeUrl};

use super::fetch::HostingError;

/// Which rate window was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    Platform,
    Global,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Platform => "platform",
            RateLimitScope::Global => "global",
        }
    }
}

/// A publish refused by the trailing-window caps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rate limit exceeded for {platform} ({} cap: {count}/{max} in the last {window_secs}s)", scope.as_str())]
pub struct RateLimitError {
    pub platform: Platform,
    pub scope: RateLimitScope,
    pub count: u64,
    pub max: u64,
    pub window_secs: u64,
}

/// Rendered media that does not meet the format's bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{platform}/{post_type} rejected the media: {}", errors.join("; "))]
pub struct ValidationError {
    pub platform: Platform,
    pub post_type: PostType,
    pub errors: Vec<String>,
}

/// Why a single platform attempt failed. Never aborts the batch.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("media preparation failed: {0}")]
    Media(#[from] ConverterError),

    #[error(transparent)]
    UnsafeUrl(#[from] UnsafeUrl),

    #[error(transparent)]
    ModerationBlocked(#[from] ModerationBlocked),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("no adapter registered for {0}")]
    NoAdapter(Platform),

    #[error("{platform} cannot publish this media: {reason}")]
    UnsupportedMedia { platform: Platform, reason: String },

    #[error(transparent)]
    Hosting(#[from] HostingError),

    #[error("batch cancelled")]
    Cancelled,

    #[error("history store error: {0}")]
    Store(#[from] StoreError),

    #[error("workspace error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttemptError {
    pub fn unsupported_media(platform: Platform, reason: impl Into<String>) -> Self {
        Self::UnsupportedMedia {
            platform,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly category, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::RateLimited(_) => "rate_limited",
            AttemptError::Validation(_) => "validation",
            AttemptError::Media(_) => "media",
            AttemptError::UnsafeUrl(_) => "unsafe_url",
            AttemptError::ModerationBlocked(_) => "moderation",
            AttemptError::Publish(_) => "publish",
            AttemptError::NoAdapter(_) => "no_adapter",
            AttemptError::UnsupportedMedia { .. } => "unsupported_media",
            AttemptError::Hosting(_) => "hosting",
            AttemptError::Cancelled => "cancelled",
            AttemptError::Store(_) => "store",
            AttemptError::Io(_) => "io",
        }
    }
}

/// Batch setup failures. These surface before any platform is attempted.
#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("failed to prepare workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("media source not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("failed to probe media source: {0}")]
    Probe(#[source] ConverterError),

    #[error("history store error: {0}")]
    Store(#[from] StoreError),
}

impl PublisherError {
    pub fn download(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message() {
        let err = AttemptError::from(RateLimitError {
            platform: Platform::Facebook,
            scope: RateLimitScope::Platform,
            count: 3,
            max: 3,
            window_secs: 3600,
        });
        let message = err.to_string();
        assert!(message.contains("rate limit exceeded"));
        assert!(message.contains("facebook"));
        assert_eq!(err.kind(), "rate_limited");
    }

    #[test]
    fn test_validation_message_joins_errors() {
        let err = ValidationError {
            platform: Platform::Tiktok,
            post_type: PostType::Video,
            errors: vec!["too long".to_string(), "too big".to_string()],
        };
        assert_eq!(err.to_string(), "tiktok/video rejected the media: too long; too big");
    }
}
