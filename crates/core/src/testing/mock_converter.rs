//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::{
    target_dimensions, ConversionResult, Converter, ConverterError, ImageConversion,
    MediaDescriptor, MediaKind, VideoConversion,
};

/// A recorded conversion for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: MediaKind,
    /// Requested ratio, "W:H".
    pub ratio: String,
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversions for assertions
/// - Simulate failures
/// - Control probe results
///
/// Conversions write a small placeholder file to the requested output path
/// and report geometry computed with the real ratio math, so the rendered
/// media passes through format validation like real output would.
///
/// # Example
///
/// ```rust,ignore
/// use spreadit_core::testing::{fixtures, MockConverter};
///
/// let converter = MockConverter::new();
/// converter
///     .set_probe_result("/media/clip.mp4", fixtures::video_descriptor("/media/clip.mp4", 30.0))
///     .await;
///
/// let conversions = converter.recorded_conversions().await;
/// ```
#[derive(Debug)]
pub struct MockConverter {
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaDescriptor>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// If set, the next conversion leaves a partial output and fails.
    conversion_error: Arc<RwLock<Option<ConverterError>>>,
    /// Reported size of rendered files.
    output_size_bytes: Arc<RwLock<u64>>,
    fail_thumbnails: Arc<RwLock<bool>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_error: Arc::new(RwLock::new(None)),
            output_size_bytes: Arc::new(RwLock::new(5 * 1024 * 1024)),
            fail_thumbnails: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, descriptor: MediaDescriptor) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), descriptor);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make the next video or image conversion fail after writing part of
    /// its output. Probes are unaffected.
    pub async fn set_conversion_error(&self, error: ConverterError) {
        *self.conversion_error.write().await = Some(error);
    }

    /// Set the size reported for rendered files.
    pub async fn set_output_size(&self, bytes: u64) {
        *self.output_size_bytes.write().await = bytes;
    }

    /// Make thumbnail extraction fail.
    pub async fn set_fail_thumbnails(&self, fail: bool) {
        *self.fail_thumbnails.write().await = fail;
    }

    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    /// Pending error for a conversion, leaving a partial file behind when it
    /// is a mid-conversion failure.
    async fn take_conversion_error(&self, output: &Path) -> Option<ConverterError> {
        if let Some(err) = self.take_error().await {
            return Some(err);
        }
        let err = self.conversion_error.write().await.take()?;
        if let Err(e) = Self::write_output(output).await {
            return Some(e);
        }
        Some(err)
    }

    async fn describe(&self, path: &Path) -> MediaDescriptor {
        match self.probe_results.read().await.get(path) {
            Some(descriptor) => descriptor.clone(),
            None => Self::create_default_descriptor(path),
        }
    }

    /// Guess a descriptor from the file extension.
    fn create_default_descriptor(path: &Path) -> MediaDescriptor {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_lowercase();

        let is_image = matches!(extension.as_str(), "jpg" | "jpeg" | "png" | "webp" | "gif");
        if is_image {
            MediaDescriptor {
                path: path.to_path_buf(),
                kind: MediaKind::Image,
                width: 1080,
                height: 1350,
                duration_secs: None,
                size_bytes: 2 * 1024 * 1024,
                codec: "mjpeg".to_string(),
                container_format: "image2".to_string(),
                frame_rate: None,
            }
        } else {
            MediaDescriptor {
                path: path.to_path_buf(),
                kind: MediaKind::Video,
                width: 1920,
                height: 1080,
                duration_secs: Some(30.0),
                size_bytes: 40 * 1024 * 1024,
                codec: "h264".to_string(),
                container_format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
                frame_rate: Some(30.0),
            }
        }
    }

    async fn write_output(output: &Path) -> Result<(), ConverterError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, b"mock media").await?;
        Ok(())
    }

    async fn record(&self, input: &Path, output: &Path, kind: MediaKind, ratio: &str, success: bool) {
        self.conversions.write().await.push(RecordedConversion {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            kind,
            ratio: ratio.to_string(),
            success,
        });
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaDescriptor, ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.describe(path).await)
    }

    async fn convert_video(
        &self,
        input: &Path,
        output: &Path,
        request: &VideoConversion,
    ) -> Result<ConversionResult, ConverterError> {
        if let Some(err) = self.take_conversion_error(output).await {
            self.record(input, output, MediaKind::Video, &request.ratio, false)
                .await;
            return Err(err);
        }

        let source = self.describe(input).await;
        let duration = source.duration_secs.unwrap_or(0.0);
        if let Some(min_secs) = request.min_duration_secs {
            if duration < min_secs {
                self.record(input, output, MediaKind::Video, &request.ratio, false)
                    .await;
                return Err(ConverterError::TooShort {
                    duration_secs: duration,
                    min_secs,
                });
            }
        }

        let dims = target_dimensions(source.width, source.height, &request.ratio, request.max_width)?;
        let duration = match request.max_duration_secs {
            Some(max) => duration.min(max),
            None => duration,
        };

        Self::write_output(output).await?;
        self.record(input, output, MediaKind::Video, &request.ratio, true)
            .await;

        Ok(ConversionResult {
            output_path: output.to_path_buf(),
            width: dims.width,
            height: dims.height,
            duration_secs: Some(duration),
            size_bytes: *self.output_size_bytes.read().await,
            elapsed_ms: 0,
        })
    }

    async fn convert_image(
        &self,
        input: &Path,
        output: &Path,
        request: &ImageConversion,
    ) -> Result<ConversionResult, ConverterError> {
        if let Some(err) = self.take_conversion_error(output).await {
            self.record(input, output, MediaKind::Image, &request.ratio, false)
                .await;
            return Err(err);
        }

        let source = self.describe(input).await;
        let dims = target_dimensions(source.width, source.height, &request.ratio, request.max_width)?;

        Self::write_output(output).await?;
        self.record(input, output, MediaKind::Image, &request.ratio, true)
            .await;

        Ok(ConversionResult {
            output_path: output.to_path_buf(),
            width: dims.width,
            height: dims.height,
            duration_secs: None,
            size_bytes: *self.output_size_bytes.read().await,
            elapsed_ms: 0,
        })
    }

    async fn generate_thumbnail(
        &self,
        _video: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<PathBuf, ConverterError> {
        if *self.fail_thumbnails.read().await {
            return Err(ConverterError::thumbnail_failed(format!(
                "no frame at {:.1}s",
                offset_secs
            )));
        }
        Self::write_output(output).await?;
        Ok(output.to_path_buf())
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
