//! Adapter error type.

use thiserror::Error;

use crate::formats::Platform;

/// A platform call that did not produce a published post.
#[derive(Debug, Clone, Error)]
#[error("{platform} publish failed{}: {message}", http_status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
pub struct PublishError {
    pub platform: Platform,
    /// Status of the failing HTTP response, when there was one.
    pub http_status: Option<u16>,
    pub message: String,
}

impl PublishError {
    pub fn new(platform: Platform, message: impl Into<String>) -> Self {
        Self {
            platform,
            http_status: None,
            message: message.into(),
        }
    }

    pub fn http(platform: Platform, status: u16, message: impl Into<String>) -> Self {
        Self {
            platform,
            http_status: Some(status),
            message: message.into(),
        }
    }

    /// Wraps a transport failure (connect, timeout, body read).
    pub fn transport(platform: Platform, err: reqwest::Error) -> Self {
        Self {
            platform,
            http_status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// The platform answered, but not with what we expected.
    pub fn unexpected(platform: Platform, what: impl std::fmt::Display) -> Self {
        Self::new(platform, format!("unexpected response: {}", what))
    }

    pub fn unsupported(platform: Platform, what: impl std::fmt::Display) -> Self {
        Self::new(platform, format!("unsupported: {}", what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status() {
        let err = PublishError::http(Platform::Twitter, 403, "forbidden");
        assert_eq!(err.to_string(), "twitter publish failed (HTTP 403): forbidden");

        let err = PublishError::new(Platform::Tiktok, "no video");
        assert_eq!(err.to_string(), "tiktok publish failed: no video");
    }
}
