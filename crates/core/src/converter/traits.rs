//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ConverterError;
use super::types::{ConversionResult, ImageConversion, MediaDescriptor, VideoConversion};

/// A converter that can probe and reshape media files for a target platform.
///
/// Implementations only ever write to the requested output path; inputs are
/// treated as read-only.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its description.
    async fn probe(&self, path: &Path) -> Result<MediaDescriptor, ConverterError>;

    /// Re-encodes a video to the requested ratio, codecs and duration bounds.
    async fn convert_video(
        &self,
        input: &Path,
        output: &Path,
        request: &VideoConversion,
    ) -> Result<ConversionResult, ConverterError>;

    /// Re-encodes a still image to the requested ratio and format.
    async fn convert_image(
        &self,
        input: &Path,
        output: &Path,
        request: &ImageConversion,
    ) -> Result<ConversionResult, ConverterError>;

    /// Extracts a single frame at `offset_secs` as a thumbnail.
    async fn generate_thumbnail(
        &self,
        video: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<PathBuf, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
