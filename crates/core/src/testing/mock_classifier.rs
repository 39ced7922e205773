//! Mock image classifier for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::moderation::{ImageClassifier, ModerationError, SafetyAnnotation};

/// Mock implementation of the ImageClassifier trait.
///
/// Returns a configurable annotation (all `Unknown` by default), can be made
/// to fail or to respond slowly.
#[derive(Debug, Default)]
pub struct MockClassifier {
    annotation: Arc<RwLock<SafetyAnnotation>>,
    fail: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Duration>>,
    calls: Arc<RwLock<usize>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotation returned by subsequent calls.
    pub async fn set_annotation(&self, annotation: SafetyAnnotation) {
        *self.annotation.write().await = annotation;
    }

    /// Make subsequent calls return an API error.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Delay before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl ImageClassifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn classify(&self, _path: &Path) -> Result<SafetyAnnotation, ModerationError> {
        *self.calls.write().await += 1;

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.fail.read().await {
            return Err(ModerationError::ApiError {
                status: 503,
                message: "classifier unavailable".to_string(),
            });
        }

        Ok(*self.annotation.read().await)
    }
}
