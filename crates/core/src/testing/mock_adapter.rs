//! Mock platform adapter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::adapters::{PlatformAdapter, PreparedPost, PublishError, PublishReceipt};
use crate::formats::Platform;

/// A post seen by the mock, with whether its media file existed at call time.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub post: PreparedPost,
    pub media_present: bool,
}

/// Mock implementation of the PlatformAdapter trait.
///
/// Records every post it receives and answers with a deterministic receipt
/// (`<platform>-<n>`), unless told to fail.
#[derive(Debug)]
pub struct MockAdapter {
    platform: Platform,
    needs_public_url: bool,
    posts: Arc<RwLock<Vec<RecordedPost>>>,
    /// If set, every publish fails with this error.
    error: Arc<RwLock<Option<PublishError>>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockAdapter {
    /// Create a mock adapter for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            needs_public_url: false,
            posts: Arc::new(RwLock::new(Vec::new())),
            error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Behave like a platform that pulls media from a public URL.
    pub fn with_public_url(mut self) -> Self {
        self.needs_public_url = true;
        self
    }

    /// Fail every publish with an HTTP error carrying `message`.
    pub async fn set_fail(&self, status: u16, message: &str) {
        *self.error.write().await = Some(PublishError::http(self.platform, status, message));
    }

    /// Clear any configured failure.
    pub async fn clear_fail(&self) {
        *self.error.write().await = None;
    }

    /// Simulated platform latency.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded posts.
    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.posts.read().await.clone()
    }

    /// Number of publish calls received.
    pub async fn call_count(&self) -> usize {
        self.posts.read().await.len()
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn needs_public_url(&self) -> bool {
        self.needs_public_url
    }

    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError> {
        let media_present = post
            .media
            .as_ref()
            .map(|m| m.path.exists())
            .unwrap_or(false);

        let count = {
            let mut posts = self.posts.write().await;
            posts.push(RecordedPost {
                post: post.clone(),
                media_present,
            });
            posts.len()
        };

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.error.read().await.clone() {
            return Err(err);
        }

        let remote_id = format!("{}-{}", self.platform, count);
        Ok(PublishReceipt::new(
            remote_id.clone(),
            Some(format!("https://social.example/{}/{}", self.platform, remote_id)),
        ))
    }
}
