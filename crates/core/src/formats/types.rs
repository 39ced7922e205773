//! Platform and format descriptor types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Linkedin,
    Tiktok,
    Youtube,
}

impl Platform {
    /// All platforms, in registry order.
    pub const ALL: [Platform; 6] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Tiktok,
        Platform::Youtube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }

    /// Lenient lookup by name; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "facebook" => Some(Platform::Facebook),
            "instagram" => Some(Platform::Instagram),
            "twitter" | "x" => Some(Platform::Twitter),
            "linkedin" => Some(Platform::Linkedin),
            "tiktok" => Some(Platform::Tiktok),
            "youtube" => Some(Platform::Youtube),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown platform name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::parse(s).ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Kind of publication on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Post,
    Reel,
    Story,
    Feed,
    Carousel,
    Tweet,
    Article,
    Document,
    Video,
    Short,
    Unlisted,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Reel => "reel",
            PostType::Story => "story",
            PostType::Feed => "feed",
            PostType::Carousel => "carousel",
            PostType::Tweet => "tweet",
            PostType::Article => "article",
            PostType::Document => "document",
            PostType::Video => "video",
            PostType::Short => "short",
            PostType::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel resolution bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Video constraints for a format.
#[derive(Debug, Clone, Serialize)]
pub struct VideoSpec {
    pub max_duration_secs: f64,
    pub min_duration_secs: Option<f64>,
    pub max_size_bytes: u64,
    /// Accepted container extensions.
    pub containers: &'static [&'static str],
    /// Required codecs, `(video, audio)`.
    pub codecs: Option<(&'static str, &'static str)>,
    pub min_resolution: Option<Resolution>,
    pub max_resolution: Option<Resolution>,
    pub recommended_resolution: Option<Resolution>,
}

/// Still-image constraints for a format.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSpec {
    pub max_size_bytes: Option<u64>,
    pub formats: &'static [&'static str],
    pub min_resolution: Option<Resolution>,
    pub max_resolution: Option<Resolution>,
}

/// Caption constraints for a format.
#[derive(Debug, Clone, Serialize)]
pub struct TextSpec {
    pub max_length: usize,
    pub max_hashtags: Option<usize>,
    /// Title limit for platforms that take a separate title.
    pub title_max_length: Option<usize>,
}

/// Static constraints for one (platform, post type) pair.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformFormatSpec {
    pub platform: Platform,
    pub post_type: PostType,
    pub display_name: &'static str,
    /// Accepted ratios; the first one is the recommended target.
    pub allowed_ratios: &'static [&'static str],
    pub video: Option<VideoSpec>,
    pub image: Option<ImageSpec>,
    pub text: Option<TextSpec>,
    pub optimal: bool,
    /// Content disappears after 24h.
    pub ephemeral: bool,
}

impl PlatformFormatSpec {
    pub fn accepts_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn accepts_image(&self) -> bool {
        self.image.is_some()
    }

    /// First allowed ratio, if the format has any.
    pub fn target_ratio(&self) -> Option<&'static str> {
        self.allowed_ratios.first().copied()
    }
}

/// Outcome of validating media against a format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl MediaValidation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}
