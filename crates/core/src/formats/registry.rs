//! Lookup and validation over the platform format table.

use once_cell::sync::Lazy;

use super::builtin::builtin_specs;
use super::types::{MediaValidation, Platform, PlatformFormatSpec, PostType};
use crate::converter::MediaDescriptor;

/// YouTube videos shorter than this publish as Shorts.
pub const YOUTUBE_SHORT_MAX_SECS: f64 = 60.0;

/// Container rounding lets a render cut with `-t` run this far past the
/// cut point. Durations within it still count as meeting the maximum.
pub const DURATION_TOLERANCE_SECS: f64 = 0.1;

static BUILTIN: Lazy<FormatRegistry> = Lazy::new(|| FormatRegistry::new(builtin_specs()));

/// Read-only table of platform format constraints.
///
/// Specs keep their insertion order, which decides the fallback when a
/// platform has no format flagged optimal.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    specs: Vec<PlatformFormatSpec>,
}

impl FormatRegistry {
    /// Builds a registry from an explicit list of specs.
    pub fn new(specs: Vec<PlatformFormatSpec>) -> Self {
        Self { specs }
    }

    /// The built-in registry.
    pub fn builtin() -> &'static FormatRegistry {
        &BUILTIN
    }

    /// All specs for a platform, in insertion order.
    pub fn formats_for(&self, platform: Platform) -> impl Iterator<Item = &PlatformFormatSpec> {
        self.specs.iter().filter(move |s| s.platform == platform)
    }

    pub fn get(&self, platform: Platform, post_type: PostType) -> Option<&PlatformFormatSpec> {
        self.specs
            .iter()
            .find(|s| s.platform == platform && s.post_type == post_type)
    }

    /// Post type flagged optimal, else the first defined; `None` if the
    /// platform has no formats.
    pub fn optimal_format(&self, platform: Platform) -> Option<PostType> {
        let mut formats = self.formats_for(platform).peekable();
        let first = formats.peek().map(|s| s.post_type)?;
        formats
            .find(|s| s.optimal)
            .map(|s| s.post_type)
            .or(Some(first))
    }

    /// Same as [`optimal_format`](Self::optimal_format) but by platform name.
    pub fn optimal_format_by_name(&self, platform: &str) -> Option<PostType> {
        Platform::parse(platform).and_then(|p| self.optimal_format(p))
    }

    /// Recommended (first allowed) ratio for a format.
    pub fn target_ratio(&self, platform: Platform, post_type: PostType) -> Option<&'static str> {
        self.get(platform, post_type).and_then(|s| s.target_ratio())
    }

    /// Picks the post type to publish `media` as.
    ///
    /// YouTube splits on duration; images go to the optimal type when it
    /// accepts images, else to the first type that does; text-only posts use
    /// the optimal type.
    pub fn post_type_for(
        &self,
        platform: Platform,
        media: Option<&MediaDescriptor>,
    ) -> Option<PostType> {
        let Some(media) = media else {
            return self.optimal_format(platform);
        };

        if media.is_video() {
            if platform == Platform::Youtube {
                let duration = media.duration_secs.unwrap_or(0.0);
                return Some(if duration < YOUTUBE_SHORT_MAX_SECS {
                    PostType::Short
                } else {
                    PostType::Video
                });
            }
            let optimal = self.optimal_format(platform)?;
            if self.get(platform, optimal).is_some_and(|s| s.accepts_video()) {
                return Some(optimal);
            }
            return self
                .formats_for(platform)
                .find(|s| s.accepts_video())
                .map(|s| s.post_type);
        }

        let optimal = self.optimal_format(platform)?;
        if self.get(platform, optimal).is_some_and(|s| s.accepts_image()) {
            return Some(optimal);
        }
        self.formats_for(platform)
            .find(|s| s.accepts_image())
            .map(|s| s.post_type)
    }

    /// Checks duration and size bounds of `media` against a format.
    ///
    /// Codec and container are not checked here; the transcoder guarantees
    /// them.
    pub fn validate_media(
        &self,
        platform: Platform,
        post_type: PostType,
        media: &MediaDescriptor,
    ) -> MediaValidation {
        let Some(spec) = self.get(platform, post_type) else {
            return MediaValidation::from_errors(vec![format!(
                "unknown format {}/{}",
                platform, post_type
            )]);
        };

        let mut errors = Vec::new();

        if media.is_video() {
            match &spec.video {
                Some(video) => {
                    if let Some(duration) = media.duration_secs {
                        if duration > video.max_duration_secs + DURATION_TOLERANCE_SECS {
                            errors.push(format!(
                                "duration {:.1}s exceeds the {}s maximum",
                                duration, video.max_duration_secs
                            ));
                        }
                        if let Some(min) = video.min_duration_secs {
                            if duration < min {
                                errors.push(format!(
                                    "duration {:.1}s is below the {}s minimum",
                                    duration, min
                                ));
                            }
                        }
                    }
                    if media.size_bytes > video.max_size_bytes {
                        errors.push(format!(
                            "size {} exceeds the {} video maximum",
                            format_size(media.size_bytes),
                            format_size(video.max_size_bytes)
                        ));
                    }
                }
                None => errors.push(format!("{}/{} does not accept video", platform, post_type)),
            }
        } else {
            match &spec.image {
                Some(image) => {
                    if let Some(max) = image.max_size_bytes {
                        if media.size_bytes > max {
                            errors.push(format!(
                                "size {} exceeds the {} image maximum",
                                format_size(media.size_bytes),
                                format_size(max)
                            ));
                        }
                    }
                }
                None => errors.push(format!("{}/{} does not accept images", platform, post_type)),
            }
        }

        MediaValidation::from_errors(errors)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(builtin_specs())
    }
}

fn format_size(bytes: u64) -> String {
    format!("{:.0}MB", bytes as f64 / 1024.0 / 1024.0)
}
