//! Platform format registry.
//!
//! Static per-platform, per-post-type constraints (ratios, duration and size
//! bounds, caption limits) plus the lookups the publisher needs: optimal post
//! type, target ratio, post type for a given media file, and media
//! validation.

mod builtin;
mod registry;
mod types;

pub use registry::{FormatRegistry, DURATION_TOLERANCE_SECS, YOUTUBE_SHORT_MAX_SECS};
pub use types::{
    ImageSpec, MediaValidation, Platform, PlatformFormatSpec, PostType, Resolution, TextSpec,
    UnknownPlatform, VideoSpec,
};
