//! Types handed to and returned from platform adapters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::converter::MediaKind;
use crate::formats::PostType;

/// A rendered media file, ready for upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedMedia {
    /// Rendered output inside the attempt's temp dir.
    pub path: PathBuf,
    pub kind: MediaKind,
    pub width: u32,
    pub height: u32,
    pub duration_secs: Option<f64>,
    pub size_bytes: u64,
    /// Publicly reachable copy, required by container-based APIs.
    pub public_url: Option<String>,
    /// Cover image, when one could be generated.
    pub thumbnail: Option<PathBuf>,
}

impl PreparedMedia {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// MIME type guessed from the output extension.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "m4v" => "video/mp4",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "png" => "image/png",
            "webp" => "image/webp",
            "jpg" | "jpeg" => "image/jpeg",
            _ if self.is_video() => "video/mp4",
            _ => "image/jpeg",
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string())
    }
}

/// Everything an adapter needs for one post.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPost {
    pub post_type: PostType,
    /// Final caption, already formatted and truncated for the platform.
    pub caption: String,
    /// Explicit title for platforms that have one.
    pub title: Option<String>,
    /// Normalized hashtags without the leading `#`.
    pub hashtags: Vec<String>,
    pub media: Option<PreparedMedia>,
}

impl PreparedPost {
    pub fn text(post_type: PostType, caption: impl Into<String>) -> Self {
        Self {
            post_type,
            caption: caption.into(),
            title: None,
            hashtags: Vec::new(),
            media: None,
        }
    }

    pub fn with_media(mut self, media: PreparedMedia) -> Self {
        self.media = Some(media);
        self
    }
}

/// What the platform returned for a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub remote_id: String,
    pub remote_url: Option<String>,
}

impl PublishReceipt {
    pub fn new(remote_id: impl Into<String>, remote_url: Option<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            remote_url,
        }
    }
}
