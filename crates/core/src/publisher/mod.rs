//! Publish orchestration.
//!
//! [`Publisher::publish_batch`] takes one caption, an optional media source
//! and an ordered platform list, and for each platform:
//!
//! 1. checks the trailing-window rate caps,
//! 2. waits the platform's pacing delay (every platform after the first),
//! 3. renders the media to the platform format and formats the caption,
//! 4. screens caption URLs and runs the moderation gate,
//! 5. dispatches to the platform adapter and records the attempt.
//!
//! A failing platform never stops the batch; the result lists every
//! attempt and `overall_success` is true only if all of them succeeded.

mod caption;
mod config;
mod error;
mod fetch;
mod orchestrator;
mod rate;
mod types;

pub use caption::{format_caption, normalize_hashtags, truncate_chars, FormattedCaption};
pub use config::{PacingConfig, PublisherConfig, RateLimitConfig};
pub use error::{
    AttemptError, PublisherError, RateLimitError, RateLimitScope, ValidationError,
};
pub use fetch::{HostingError, MediaFetcher, MediaHost};
pub use orchestrator::Publisher;
pub use rate::{BatchWindow, RateLimiter};
pub use types::{
    AttemptState, CaptionDraft, MediaSource, PublishAttemptResult, PublishBatchResult,
    PublishRequest,
};
