//! Content moderation: caption keywords, caption URLs and image safety.
//!
//! The image classifier is an external collaborator behind
//! [`ImageClassifier`]; [`VisionClassifier`] talks to Google Cloud Vision.

mod config;
mod error;
mod gate;
mod text;
mod traits;
mod types;
mod url_guard;
mod vision;

pub use config::{ModerationConfig, PlatformModeration};
pub use error::ModerationError;
pub use gate::{GateReport, ImageCheck, ModerationBlocked, ModerationGate};
pub use text::KeywordFilter;
pub use traits::ImageClassifier;
pub use types::{BlockThresholds, Likelihood, SafetyAnnotation};
pub use url_guard::{UnsafeUrl, UrlGuard};
pub use vision::{VisionClassifier, VisionConfig};
