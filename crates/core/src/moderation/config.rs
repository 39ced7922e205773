//! Configuration for the moderation module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{BlockThresholds, Likelihood};
use super::vision::VisionConfig;
use crate::formats::Platform;

/// Moderation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Caption keyword hits at or above this count block the post.
    #[serde(default = "default_text_block_threshold")]
    pub text_block_threshold: usize,

    /// Keywords counted against captions.
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,

    /// Link-shortener domains rejected in caption URLs.
    #[serde(default = "default_blocked_url_domains")]
    pub blocked_url_domains: Vec<String>,

    /// Substrings rejected anywhere in caption URLs.
    #[serde(default = "default_blocked_url_keywords")]
    pub blocked_url_keywords: Vec<String>,

    /// Default image block thresholds.
    #[serde(default)]
    pub thresholds: BlockThresholds,

    /// Per-platform overrides.
    #[serde(default)]
    pub platforms: HashMap<Platform, PlatformModeration>,

    /// Upper bound for one classifier call, in milliseconds.
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Google Vision SafeSearch settings; no image classification without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,
}

/// Per-platform moderation overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformModeration {
    /// Whether images bound for this platform go through the classifier.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult: Option<Likelihood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violence: Option<Likelihood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub racy: Option<Likelihood>,
}

impl Default for PlatformModeration {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            adult: None,
            violence: None,
            racy: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_text_block_threshold() -> usize {
    2
}

fn default_blocked_keywords() -> Vec<String> {
    ["porn", "xxx", "explicit", "nude", "sex", "nsfw", "adult"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_blocked_url_domains() -> Vec<String> {
    [
        "bit.ly",
        "tinyurl.com",
        "goo.gl",
        "t.co",
        "ow.ly",
        "is.gd",
        "buff.ly",
        "adf.ly",
        "shorte.st",
        "cutt.ly",
        "rebrand.ly",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_blocked_url_keywords() -> Vec<String> {
    ["porn", "xxx", "nsfw", "casino", "viagra", "free-money"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_classifier_timeout_ms() -> u64 {
    6000
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            text_block_threshold: default_text_block_threshold(),
            blocked_keywords: default_blocked_keywords(),
            blocked_url_domains: default_blocked_url_domains(),
            blocked_url_keywords: default_blocked_url_keywords(),
            thresholds: BlockThresholds::default(),
            platforms: HashMap::new(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
            vision: None,
        }
    }
}

impl ModerationConfig {
    /// Effective thresholds for a platform.
    pub fn thresholds_for(&self, platform: Platform) -> BlockThresholds {
        let base = self.thresholds;
        match self.platforms.get(&platform) {
            Some(o) => BlockThresholds {
                adult: o.adult.unwrap_or(base.adult),
                violence: o.violence.unwrap_or(base.violence),
                racy: o.racy.unwrap_or(base.racy),
            },
            None => base,
        }
    }

    /// Whether image classification applies to a platform.
    pub fn image_check_enabled(&self, platform: Platform) -> bool {
        self.platforms
            .get(&platform)
            .map(|o| o.enabled)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModerationConfig::default();
        assert_eq!(config.text_block_threshold, 2);
        assert!(config.blocked_keywords.contains(&"nsfw".to_string()));
        assert!(config.blocked_url_domains.contains(&"bit.ly".to_string()));
        assert_eq!(config.classifier_timeout_ms, 6000);
        assert!(config.image_check_enabled(Platform::Instagram));
    }

    #[test]
    fn test_platform_override_merges() {
        let toml = r#"
[thresholds]
adult = "LIKELY"

[platforms.linkedin]
adult = "POSSIBLE"

[platforms.twitter]
enabled = false
"#;
        let config: ModerationConfig = toml::from_str(toml).unwrap();
        let linkedin = config.thresholds_for(Platform::Linkedin);
        assert_eq!(linkedin.adult, Likelihood::Possible);
        assert_eq!(linkedin.racy, Likelihood::VeryLikely);
        assert_eq!(
            config.thresholds_for(Platform::Facebook).adult,
            Likelihood::Likely
        );
        assert!(!config.image_check_enabled(Platform::Twitter));
        assert!(config.image_check_enabled(Platform::Linkedin));
    }
}
