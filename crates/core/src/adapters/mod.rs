//! Platform adapters.
//!
//! Each adapter turns a [`PreparedPost`] into one publish call against a
//! platform's HTTP API and reports either a [`PublishReceipt`] or a
//! [`PublishError`]. Adapters never retry; the publisher decides what a
//! failure means for the batch.
//!
//! | Platform  | Flow                                                    |
//! |-----------|---------------------------------------------------------|
//! | Facebook  | `/feed`, `/photos`, `/videos` or `video_reels` phases   |
//! | Instagram | `/media` container, grace period, `/media_publish`      |
//! | Twitter   | media upload (chunked for video), then `POST /2/tweets` |
//! | LinkedIn  | `registerUpload`, binary PUT, `ugcPosts`                |
//! | TikTok    | `post/publish/video/init/`, chunked PUT                 |
//! | YouTube   | resumable `videos.insert`, optional `thumbnails.set`    |

mod config;
mod error;
mod facebook;
mod http;
mod instagram;
mod linkedin;
mod registry;
mod tiktok;
mod traits;
mod twitter;
mod types;
mod youtube;

pub use config::{
    FacebookConfig, InstagramConfig, LinkedinConfig, PlatformsConfig, TiktokConfig,
    TwitterConfig, YoutubeConfig,
};
pub use error::PublishError;
pub use facebook::FacebookAdapter;
pub use instagram::InstagramAdapter;
pub use linkedin::LinkedinAdapter;
pub use registry::{build_adapters, AdapterRegistry};
pub use tiktok::TiktokAdapter;
pub use traits::PlatformAdapter;
pub use twitter::TwitterAdapter;
pub use types::{PreparedMedia, PreparedPost, PublishReceipt};
pub use youtube::YoutubeAdapter;
