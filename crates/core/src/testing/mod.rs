//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborators
//! (transcoder, platform APIs, image classifier, media hosting), allowing
//! publish batches to be exercised end to end without ffmpeg or network.
//!
//! # Example
//!
//! ```rust,ignore
//! use spreadit_core::testing::{MockAdapter, MockConverter};
//!
//! let converter = Arc::new(MockConverter::new());
//! let facebook = Arc::new(MockAdapter::new(Platform::Facebook));
//! let adapters = AdapterRegistry::new().with(facebook.clone());
//!
//! // Build a Publisher, run a batch...
//! assert_eq!(facebook.call_count().await, 1);
//! ```

mod mock_adapter;
mod mock_classifier;
mod mock_converter;
mod mock_media_host;

pub use mock_adapter::{MockAdapter, RecordedPost};
pub use mock_classifier::MockClassifier;
pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_media_host::MockMediaHost;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::converter::{MediaDescriptor, MediaKind};

    /// A 1920x1080 h264 video descriptor.
    pub fn video_descriptor(path: impl AsRef<Path>, duration_secs: f64) -> MediaDescriptor {
        MediaDescriptor {
            path: path.as_ref().to_path_buf(),
            kind: MediaKind::Video,
            width: 1920,
            height: 1080,
            duration_secs: Some(duration_secs),
            size_bytes: 40 * 1024 * 1024,
            codec: "h264".to_string(),
            container_format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            frame_rate: Some(30.0),
        }
    }

    /// A 1080x1350 JPEG descriptor.
    pub fn image_descriptor(path: impl AsRef<Path>) -> MediaDescriptor {
        MediaDescriptor {
            path: path.as_ref().to_path_buf(),
            kind: MediaKind::Image,
            width: 1080,
            height: 1350,
            duration_secs: None,
            size_bytes: 2 * 1024 * 1024,
            codec: "mjpeg".to_string(),
            container_format: "image2".to_string(),
            frame_rate: None,
        }
    }

    /// Writes a placeholder source file named `name` into `dir`.
    pub fn source_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"source media").expect("Failed to write source fixture");
        path
    }
}
