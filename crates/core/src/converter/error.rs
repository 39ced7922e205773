//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing or converting media.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Aspect ratio string could not be parsed.
    #[error("Invalid aspect ratio: {ratio}")]
    InvalidRatio { ratio: String },

    /// Source or target dimensions are unusable.
    #[error("Invalid dimensions: {reason}")]
    InvalidDimensions { reason: String },

    /// Source is shorter than the platform minimum.
    #[error("Source is {duration_secs:.1}s, shorter than the {min_secs:.1}s minimum")]
    TooShort { duration_secs: f64, min_secs: f64 },

    /// Transcoding process failed.
    #[error("Transcode failed: {reason}")]
    TranscodeFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Thumbnail extraction failed.
    #[error("Thumbnail failed: {reason}")]
    ThumbnailFailed { reason: String },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new transcode failed error with stderr output.
    pub fn transcode_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::TranscodeFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new thumbnail failed error.
    pub fn thumbnail_failed(reason: impl Into<String>) -> Self {
        Self::ThumbnailFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid dimensions error.
    pub fn invalid_dimensions(reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            reason: reason.into(),
        }
    }

    /// Captured ffmpeg diagnostics, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::TranscodeFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
