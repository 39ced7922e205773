//! Publisher configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::converter::{CropStrategy, ImageFormat};
use crate::formats::Platform;

/// Configuration for the publish orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Parent directory for batch and attempt temp dirs.
    /// Defaults to the system temp dir.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    /// Timeout for downloading a remote media source.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Remote sources larger than this are rejected (0 = unlimited).
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,

    /// Upper bound on rendered video width.
    #[serde(default = "default_video_max_width")]
    pub video_max_width: u32,

    /// Upper bound on rendered image width.
    #[serde(default = "default_image_max_width")]
    pub image_max_width: u32,

    #[serde(default)]
    pub image_format: ImageFormat,

    /// Encoder quality for rendered images (1-100).
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    /// Where in the video the YouTube thumbnail is taken.
    #[serde(default = "default_thumbnail_offset")]
    pub thumbnail_offset_secs: f64,

    /// Ratio fitting when a request does not choose one.
    #[serde(default)]
    pub crop_strategy: CropStrategy,
}

fn default_download_timeout() -> u64 {
    300
}

fn default_max_download_bytes() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

fn default_video_max_width() -> u32 {
    1920
}

fn default_image_max_width() -> u32 {
    1080
}

fn default_image_quality() -> u8 {
    90
}

fn default_thumbnail_offset() -> f64 {
    1.0
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            rate_limit: RateLimitConfig::default(),
            pacing: PacingConfig::default(),
            download_timeout_secs: default_download_timeout(),
            max_download_bytes: default_max_download_bytes(),
            video_max_width: default_video_max_width(),
            image_max_width: default_image_max_width(),
            image_format: ImageFormat::default(),
            image_quality: default_image_quality(),
            thumbnail_offset_secs: default_thumbnail_offset(),
            crop_strategy: CropStrategy::default(),
        }
    }
}

impl PublisherConfig {
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Work dir, falling back to `<tmp>/spreadit`.
    pub fn resolved_work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("spreadit"))
    }
}

/// Trailing-window publish caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Successful publishes allowed per platform inside the window.
    #[serde(default = "default_per_platform_max")]
    pub per_platform_max: u64,
    /// Publishes allowed across all platforms inside the window.
    #[serde(default = "default_global_max")]
    pub global_max: u64,
}

fn default_window_secs() -> u64 {
    3600 // 1 hour
}

fn default_per_platform_max() -> u64 {
    3
}

fn default_global_max() -> u64 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            per_platform_max: default_per_platform_max(),
            global_max: default_global_max(),
        }
    }
}

/// Delay inserted before every platform after the first in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay for platforms without an entry in `per_platform_ms`.
    #[serde(default = "default_pacing_ms")]
    pub default_ms: u64,
    #[serde(default = "default_per_platform_pacing")]
    pub per_platform_ms: HashMap<Platform, u64>,
}

fn default_pacing_ms() -> u64 {
    3000
}

fn default_per_platform_pacing() -> HashMap<Platform, u64> {
    HashMap::from([
        (Platform::Facebook, 2000),
        (Platform::Instagram, 5000),
        (Platform::Twitter, 3000),
        (Platform::Linkedin, 4000),
    ])
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            default_ms: default_pacing_ms(),
            per_platform_ms: default_per_platform_pacing(),
        }
    }
}

impl PacingConfig {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            default_ms: 0,
            per_platform_ms: HashMap::new(),
        }
    }

    pub fn delay_for(&self, platform: Platform) -> Duration {
        let ms = self
            .per_platform_ms
            .get(&platform)
            .copied()
            .unwrap_or(self.default_ms);
        Duration::from_millis(ms)
    }
}
