//! Pre-publish moderation gate.
//!
//! Caption keyword screening is local and fails closed. Image classification
//! is advisory: it runs under a timeout and any classifier error or timeout
//! lets the post through.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::config::ModerationConfig;
use super::text::KeywordFilter;
use super::traits::ImageClassifier;
use super::types::SafetyAnnotation;
use super::url_guard::{UnsafeUrl, UrlGuard};
use crate::formats::Platform;
use crate::metrics;

/// Post rejected by the moderation gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("moderation blocked: {reason}")]
pub struct ModerationBlocked {
    pub reason: String,
}

/// What happened to the image during moderation.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageCheck {
    /// No image, no classifier, or the platform opted out.
    Skipped,
    /// Classifier answered and nothing crossed a threshold.
    Passed(SafetyAnnotation),
    /// Classifier failed or timed out; the post was let through.
    FailedOpen(String),
}

/// Outcome of a passing moderation check.
#[derive(Debug, Clone, PartialEq)]
pub struct GateReport {
    pub keyword_hits: Vec<String>,
    pub image: ImageCheck,
}

/// Combines keyword screening, URL screening and image classification.
pub struct ModerationGate {
    config: ModerationConfig,
    keywords: KeywordFilter,
    urls: UrlGuard,
    classifier: Option<Arc<dyn ImageClassifier>>,
}

impl ModerationGate {
    pub fn new(config: ModerationConfig, classifier: Option<Arc<dyn ImageClassifier>>) -> Self {
        let keywords = KeywordFilter::new(&config.blocked_keywords);
        let urls = UrlGuard::new(&config.blocked_url_domains, &config.blocked_url_keywords);
        Self {
            config,
            keywords,
            urls,
            classifier,
        }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Whether `check` would classify an image for `platform`.
    pub fn screens_images(&self, platform: Platform) -> bool {
        self.classifier.is_some() && self.config.image_check_enabled(platform)
    }

    /// Screens caption URLs against the denylists.
    pub fn check_urls(&self, caption: &str) -> Result<(), UnsafeUrl> {
        self.urls.check(caption)
    }

    /// Runs caption and image checks for one platform.
    pub async fn check(
        &self,
        platform: Platform,
        caption: &str,
        image: Option<&Path>,
    ) -> Result<GateReport, ModerationBlocked> {
        let keyword_hits: Vec<String> = self
            .keywords
            .hits(caption)
            .into_iter()
            .map(str::to_string)
            .collect();

        if keyword_hits.len() >= self.config.text_block_threshold {
            return Err(ModerationBlocked {
                reason: format!("caption contains blocked terms: {}", keyword_hits.join(", ")),
            });
        }

        let image_check = match (image, &self.classifier) {
            (Some(path), Some(classifier)) if self.config.image_check_enabled(platform) => {
                self.classify(platform, classifier.as_ref(), path).await?
            }
            _ => ImageCheck::Skipped,
        };

        Ok(GateReport {
            keyword_hits,
            image: image_check,
        })
    }

    async fn classify(
        &self,
        platform: Platform,
        classifier: &dyn ImageClassifier,
        path: &Path,
    ) -> Result<ImageCheck, ModerationBlocked> {
        let limit = Duration::from_millis(self.config.classifier_timeout_ms);

        let annotation = match timeout(limit, classifier.classify(path)).await {
            Ok(Ok(annotation)) => annotation,
            Ok(Err(e)) => {
                warn!(
                    platform = %platform,
                    classifier = classifier.name(),
                    error = %e,
                    "Image classifier failed, publishing without image moderation"
                );
                metrics::MODERATION_FAIL_OPEN
                    .with_label_values(&[platform.as_str(), "error"])
                    .inc();
                return Ok(ImageCheck::FailedOpen(e.to_string()));
            }
            Err(_) => {
                warn!(
                    platform = %platform,
                    classifier = classifier.name(),
                    timeout_ms = self.config.classifier_timeout_ms,
                    "Image classifier timed out, publishing without image moderation"
                );
                metrics::MODERATION_FAIL_OPEN
                    .with_label_values(&[platform.as_str(), "timeout"])
                    .inc();
                return Ok(ImageCheck::FailedOpen(format!(
                    "timed out after {} ms",
                    self.config.classifier_timeout_ms
                )));
            }
        };

        debug!(platform = %platform, ?annotation, "Image classified");

        let thresholds = self.config.thresholds_for(platform);
        if let Some((category, level)) = thresholds.first_violation(&annotation) {
            return Err(ModerationBlocked {
                reason: format!("image flagged as {} ({})", category, level),
            });
        }

        Ok(ImageCheck::Passed(annotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::Likelihood;
    use crate::testing::MockClassifier;

    fn gate(classifier: Option<Arc<dyn ImageClassifier>>) -> ModerationGate {
        ModerationGate::new(ModerationConfig::default(), classifier)
    }

    #[tokio::test]
    async fn test_single_keyword_below_threshold_passes() {
        let report = gate(None)
            .check(Platform::Facebook, "an adult conversation", None)
            .await
            .unwrap();
        assert_eq!(report.keyword_hits, vec!["adult".to_string()]);
        assert_eq!(report.image, ImageCheck::Skipped);
    }

    #[tokio::test]
    async fn test_keywords_at_threshold_block() {
        let err = gate(None)
            .check(Platform::Facebook, "nsfw and explicit", None)
            .await
            .unwrap_err();
        assert!(err.reason.contains("blocked terms"));
    }

    #[tokio::test]
    async fn test_image_over_threshold_blocks() {
        let classifier = MockClassifier::new();
        classifier
            .set_annotation(SafetyAnnotation {
                adult: Likelihood::VeryLikely,
                ..Default::default()
            })
            .await;
        let err = gate(Some(Arc::new(classifier)))
            .check(Platform::Instagram, "hello", Some(Path::new("/img.jpg")))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("moderation blocked"));
        assert!(err.reason.contains("adult"));
    }

    #[tokio::test]
    async fn test_classifier_error_fails_open() {
        let classifier = MockClassifier::new();
        classifier.set_fail(true).await;
        let report = gate(Some(Arc::new(classifier)))
            .check(Platform::Instagram, "hello", Some(Path::new("/img.jpg")))
            .await
            .unwrap();
        assert!(matches!(report.image, ImageCheck::FailedOpen(_)));
    }

    #[tokio::test]
    async fn test_classifier_timeout_fails_open() {
        let classifier = MockClassifier::new();
        classifier.set_delay(Duration::from_millis(200)).await;
        let config = ModerationConfig {
            classifier_timeout_ms: 20,
            ..Default::default()
        };
        let gate = ModerationGate::new(config, Some(Arc::new(classifier)));
        let report = gate
            .check(Platform::Instagram, "hello", Some(Path::new("/img.jpg")))
            .await
            .unwrap();
        assert!(matches!(report.image, ImageCheck::FailedOpen(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_disabled_platform_skips_classifier() {
        let classifier = Arc::new(MockClassifier::new());
        let mut config = ModerationConfig::default();
        config.platforms.insert(
            Platform::Twitter,
            crate::moderation::PlatformModeration {
                enabled: false,
                ..Default::default()
            },
        );
        let gate = ModerationGate::new(config, Some(classifier.clone()));
        let report = gate
            .check(Platform::Twitter, "hello", Some(Path::new("/img.jpg")))
            .await
            .unwrap();
        assert_eq!(report.image, ImageCheck::Skipped);
        assert_eq!(classifier.call_count().await, 0);
    }

    #[test]
    fn test_check_urls_uses_config() {
        assert!(gate(None).check_urls("https://bit.ly/x").is_err());
        assert!(gate(None).check_urls("https://example.com").is_ok());
    }
}
