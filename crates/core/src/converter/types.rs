//! Types for media probing and conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Broad kind of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// Probed description of a media file.
///
/// Produced by [`Converter::probe`](super::Converter::probe) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Path to the probed file.
    pub path: PathBuf,
    /// Video or still image.
    pub kind: MediaKind,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Duration in seconds (videos only).
    pub duration_secs: Option<f64>,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Codec of the primary visual stream (e.g., "h264", "mjpeg").
    pub codec: String,
    /// Container format name (first entry reported by ffprobe).
    pub container_format: String,
    /// Frames per second (videos only).
    pub frame_rate: Option<f64>,
}

impl MediaDescriptor {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    /// Source aspect ratio as width / height.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// Target frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Centered crop window inside a source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// How a source frame is fitted to a target aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStrategy {
    /// Cut the largest centered window of the target ratio, then scale.
    #[default]
    Crop,
    /// Scale to fit inside the target box and pad the rest.
    Pad,
}

/// Output still-image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }

    /// FFmpeg encoder name.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "mjpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "libwebp",
        }
    }
}

/// Video conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConversion {
    /// Target aspect ratio, "W:H".
    pub ratio: String,
    /// FFmpeg video encoder (e.g., "libx264").
    pub video_codec: String,
    /// FFmpeg audio encoder (e.g., "aac").
    pub audio_codec: String,
    /// Output container extension (e.g., "mp4").
    pub container: String,
    /// Upper bound for the output width.
    pub max_width: u32,
    /// Crop or pad.
    pub strategy: CropStrategy,
    /// Truncate longer sources to this many seconds.
    pub max_duration_secs: Option<f64>,
    /// Reject sources shorter than this many seconds.
    pub min_duration_secs: Option<f64>,
}

impl Default for VideoConversion {
    fn default() -> Self {
        Self {
            ratio: "16:9".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            container: "mp4".to_string(),
            max_width: 1920,
            strategy: CropStrategy::Crop,
            max_duration_secs: None,
            min_duration_secs: None,
        }
    }
}

/// Image conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConversion {
    /// Target aspect ratio, "W:H".
    pub ratio: String,
    /// Upper bound for the output width.
    pub max_width: u32,
    pub format: ImageFormat,
    /// Encoder quality, 1 (worst) to 100 (best). Ignored for PNG.
    pub quality: u8,
    pub strategy: CropStrategy,
}

impl Default for ImageConversion {
    fn default() -> Self {
        Self {
            ratio: "1:1".to_string(),
            max_width: 1080,
            format: ImageFormat::Jpeg,
            quality: 90,
            strategy: CropStrategy::Crop,
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Path of the rendered file.
    pub output_path: PathBuf,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output duration (videos only).
    pub duration_secs: Option<f64>,
    /// Output size in bytes.
    pub size_bytes: u64,
    /// Wall-clock time spent converting, in milliseconds.
    pub elapsed_ms: u64,
}
