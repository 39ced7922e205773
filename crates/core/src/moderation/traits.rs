//! Trait definitions for the moderation module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ModerationError;
use super::types::SafetyAnnotation;

/// External image-safety classifier.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Returns the name of this classifier implementation.
    fn name(&self) -> &str;

    /// Rates the image at `path` on the adult/violence/racy scales.
    async fn classify(&self, path: &Path) -> Result<SafetyAnnotation, ModerationError>;
}
