//! Converter module for probing and reshaping media for social platforms.
//!
//! This module provides the `Converter` trait and an FFmpeg-backed
//! implementation that fits videos and images to a platform's aspect ratio,
//! resolution and duration bounds.
//!
//! # Features
//!
//! - Probing via ffprobe (dimensions, duration, codec, frame rate)
//! - Ratio fitting by centered crop or by letterbox padding
//! - Duration truncation and minimum-duration rejection
//! - Still image re-encoding (JPEG, PNG, WebP)
//! - Thumbnail extraction
//!
//! # Example
//!
//! ```ignore
//! use spreadit_core::converter::{Converter, FfmpegConverter, VideoConversion};
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let request = VideoConversion {
//!     ratio: "9:16".to_string(),
//!     max_duration_secs: Some(90.0),
//!     ..Default::default()
//! };
//! let result = converter
//!     .convert_video(Path::new("in.mov"), Path::new("out.mp4"), &request)
//!     .await?;
//! println!("{}x{} in {} ms", result.width, result.height, result.elapsed_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod ratio;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use ratio::{crop_window, parse_ratio, target_dimensions, within_ratio_tolerance};
pub use traits::Converter;
pub use types::{
    ConversionResult, CropStrategy, CropWindow, Dimensions, ImageConversion, ImageFormat,
    MediaDescriptor, MediaKind, VideoConversion,
};
