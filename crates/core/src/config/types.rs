use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::adapters::PlatformsConfig;
use crate::converter::ConverterConfig;
use crate::formats::Platform;
use crate::moderation::ModerationConfig;
use crate::publisher::PublisherConfig;

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the publish history.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("spreadit.db")
}

/// Config with secrets removed, safe to print.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub database: DatabaseConfig,
    pub converter: ConverterConfig,
    pub publisher: PublisherConfig,
    pub moderation: SanitizedModerationConfig,
    pub platforms: Vec<SanitizedPlatform>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedModerationConfig {
    pub text_block_threshold: usize,
    pub blocked_keywords: usize,
    pub blocked_url_domains: usize,
    pub classifier_timeout_ms: u64,
    pub vision_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlatform {
    pub platform: Platform,
    pub configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            database: config.database.clone(),
            converter: config.converter.clone(),
            publisher: config.publisher.clone(),
            moderation: SanitizedModerationConfig {
                text_block_threshold: config.moderation.text_block_threshold,
                blocked_keywords: config.moderation.blocked_keywords.len(),
                blocked_url_domains: config.moderation.blocked_url_domains.len(),
                classifier_timeout_ms: config.moderation.classifier_timeout_ms,
                vision_configured: config
                    .moderation
                    .vision
                    .as_ref()
                    .is_some_and(|v| !v.api_key.is_empty()),
            },
            platforms: Platform::ALL
                .iter()
                .map(|p| SanitizedPlatform {
                    platform: *p,
                    configured: config.platforms.is_configured(*p),
                })
                .collect(),
        }
    }
}
