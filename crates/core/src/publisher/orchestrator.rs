//! Publish orchestrator.
//!
//! Runs one batch at a time. Shared setup (workspace, media fetch, probe,
//! rate window baseline) is fatal for the batch; after that every platform
//! is attempted strictly in request order and its failure only affects its
//! own result:
//!
//! ```text
//! Pending -> RateChecked -> (pacing) -> Formatted -> Moderated -> Dispatched
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::adapters::{AdapterRegistry, PreparedMedia, PreparedPost, PublishReceipt};
use crate::converter::{
    parse_ratio, within_ratio_tolerance, ConversionResult, Converter, ImageConversion,
    MediaDescriptor, MediaKind, VideoConversion,
};
use crate::formats::{FormatRegistry, Platform, PlatformFormatSpec, PostType};
use crate::history::{PublishRecord, RateLimitStore};
use crate::metrics;
use crate::moderation::ModerationGate;

use super::caption::format_caption;
use super::config::PublisherConfig;
use super::error::{AttemptError, PublisherError, ValidationError};
use super::fetch::{HostingError, MediaFetcher, MediaHost};
use super::rate::{BatchWindow, RateLimiter};
use super::types::{
    AttemptState, MediaSource, PublishAttemptResult, PublishBatchResult, PublishRequest,
};

/// Media shared by every attempt of a batch.
struct BatchMedia {
    path: PathBuf,
    /// Original remote URL, when the source was downloaded.
    remote_url: Option<String>,
    descriptor: MediaDescriptor,
}

/// Read-only state for one batch.
struct BatchContext<'a> {
    request: &'a PublishRequest,
    media: Option<BatchMedia>,
    dir: PathBuf,
}

/// Progress of a single platform attempt.
struct Attempt {
    platform: Platform,
    state: AttemptState,
    post_type: Option<PostType>,
}

impl Attempt {
    fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: AttemptState::Pending,
            post_type: None,
        }
    }

    fn advance(&mut self, next: AttemptState) {
        debug!("{} attempt: {} -> {}", self.platform, self.state, next);
        self.state = next;
    }
}

/// Drives publish batches across platforms.
pub struct Publisher {
    config: PublisherConfig,
    formats: Arc<FormatRegistry>,
    converter: Arc<dyn Converter>,
    adapters: AdapterRegistry,
    store: Arc<dyn RateLimitStore>,
    limiter: RateLimiter,
    moderation: ModerationGate,
    fetcher: MediaFetcher,
    host: Option<Arc<dyn MediaHost>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Publisher {
    pub fn new(
        config: PublisherConfig,
        converter: Arc<dyn Converter>,
        adapters: AdapterRegistry,
        store: Arc<dyn RateLimitStore>,
        moderation: ModerationGate,
    ) -> Result<Self, PublisherError> {
        let fetcher = MediaFetcher::new(
            std::time::Duration::from_secs(config.download_timeout_secs),
            config.max_download_bytes,
        )?;
        let limiter = RateLimiter::new(config.rate_limit.clone(), Arc::clone(&store));
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            formats: Arc::new(FormatRegistry::default()),
            converter,
            adapters,
            store,
            limiter,
            moderation,
            fetcher,
            host: None,
            shutdown_tx,
        })
    }

    /// Uses `host` to publish rendered media for URL-based platforms.
    pub fn with_media_host(mut self, host: Arc<dyn MediaHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Cancels the running batch.
    ///
    /// A pacing wait returns immediately and every platform not yet
    /// dispatched is reported as cancelled. An in-flight platform call is
    /// allowed to finish.
    pub fn cancel(&self) {
        info!("Publish batch cancellation requested");
        let _ = self.shutdown_tx.send(());
    }

    /// Publishes `request` to each of its platforms, in order.
    ///
    /// Per-platform failures are reported in the returned result; only
    /// shared setup errors return `Err`.
    pub async fn publish_batch(
        &self,
        request: &PublishRequest,
    ) -> Result<PublishBatchResult, PublisherError> {
        let mut shutdown = self.shutdown_tx.subscribe();
        let batch_id = uuid::Uuid::new_v4().to_string();
        metrics::PUBLISH_BATCHES.inc();

        info!(
            batch_id = %batch_id,
            platforms = ?request.platforms,
            media = ?request.media,
            "Starting publish batch"
        );

        let work_dir = self.config.resolved_work_dir();
        std::fs::create_dir_all(&work_dir).map_err(|e| PublisherError::Workspace {
            path: work_dir.clone(),
            source: e,
        })?;
        let batch_dir = tempfile::Builder::new()
            .prefix("batch-")
            .tempdir_in(&work_dir)
            .map_err(|e| PublisherError::Workspace {
                path: work_dir.clone(),
                source: e,
            })?;

        let media = match &request.media {
            Some(source) => Some(self.load_media(source, batch_dir.path()).await?),
            None => None,
        };

        let mut window = self.limiter.open_window(Utc::now())?;

        let ctx = BatchContext {
            request,
            media,
            dir: batch_dir.path().to_path_buf(),
        };

        let mut attempts = Vec::with_capacity(request.platforms.len());
        let mut cancelled = false;

        for (index, platform) in request.platforms.iter().copied().enumerate() {
            if !cancelled && cancel_requested(&mut shutdown) {
                cancelled = true;
            }

            let mut attempt = Attempt::new(platform);
            let outcome = if cancelled {
                Err(AttemptError::Cancelled)
            } else {
                self.execute(&ctx, &mut attempt, index, &mut window, &mut shutdown)
                    .await
            };

            let result = match outcome {
                Ok(receipt) => {
                    attempt.advance(AttemptState::Succeeded);
                    let post_type = attempt.post_type.unwrap_or(PostType::Post);
                    info!(
                        batch_id = %batch_id,
                        platform = %platform,
                        post_type = %post_type,
                        remote_id = %receipt.remote_id,
                        "Published"
                    );
                    PublishAttemptResult::succeeded(platform, post_type, receipt)
                }
                Err(e) => {
                    if matches!(e, AttemptError::Cancelled) {
                        cancelled = true;
                    }
                    warn!(
                        batch_id = %batch_id,
                        platform = %platform,
                        state = %attempt.state,
                        kind = e.kind(),
                        error = %e,
                        "Publish attempt failed"
                    );
                    PublishAttemptResult::failed(platform, attempt.post_type, attempt.state, e.to_string())
                }
            };

            metrics::PUBLISH_ATTEMPTS
                .with_label_values(&[
                    platform.as_str(),
                    if result.success { "succeeded" } else { "failed" },
                ])
                .inc();
            self.record(&batch_id, &result);
            attempts.push(result);
        }

        if let Err(e) = batch_dir.close() {
            warn!("Failed to remove batch workspace: {}", e);
        }

        let result = PublishBatchResult::from_attempts(batch_id, attempts);
        info!(
            batch_id = %result.batch_id,
            succeeded = result.succeeded_count(),
            failed = result.failed_count(),
            overall_success = result.overall_success,
            "Publish batch finished"
        );
        Ok(result)
    }

    /// Locates or downloads the source and probes it.
    async fn load_media(
        &self,
        source: &MediaSource,
        batch_dir: &Path,
    ) -> Result<BatchMedia, PublisherError> {
        let (path, remote_url) = match source {
            MediaSource::Url(url) => (
                self.fetcher.fetch(url, batch_dir).await?,
                Some(url.clone()),
            ),
            MediaSource::Path(path) => {
                if !path.is_file() {
                    return Err(PublisherError::SourceNotFound { path: path.clone() });
                }
                (path.clone(), None)
            }
        };

        let descriptor = self
            .converter
            .probe(&path)
            .await
            .map_err(PublisherError::Probe)?;
        debug!(
            "Source probed: {} {}x{} duration={:?}",
            descriptor.kind.as_str(),
            descriptor.width,
            descriptor.height,
            descriptor.duration_secs
        );

        Ok(BatchMedia {
            path,
            remote_url,
            descriptor,
        })
    }

    async fn execute(
        &self,
        ctx: &BatchContext<'_>,
        attempt: &mut Attempt,
        index: usize,
        window: &mut BatchWindow,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<PublishReceipt, AttemptError> {
        let platform = attempt.platform;
        let adapter = self
            .adapters
            .get(platform)
            .ok_or(AttemptError::NoAdapter(platform))?;

        if let Err(e) = self.limiter.check(window, platform, Utc::now()) {
            if let AttemptError::RateLimited(limit) = &e {
                metrics::RATE_LIMIT_REJECTIONS
                    .with_label_values(&[platform.as_str(), limit.scope.as_str()])
                    .inc();
            }
            return Err(e);
        }
        attempt.advance(AttemptState::RateChecked);

        if index > 0 {
            let delay = self.config.pacing.delay_for(platform);
            if !delay.is_zero() {
                debug!("Pacing {:?} before {}", delay, platform);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.recv() => return Err(AttemptError::Cancelled),
                }
            }
        }

        let descriptor = ctx.media.as_ref().map(|m| &m.descriptor);
        let post_type = match ctx.request.post_types.get(&platform) {
            Some(post_type) => *post_type,
            None => self.formats.post_type_for(platform, descriptor).ok_or_else(|| {
                AttemptError::unsupported_media(platform, "no post type accepts this media")
            })?,
        };
        attempt.post_type = Some(post_type);

        let spec = self.formats.get(platform, post_type).ok_or_else(|| {
            AttemptError::unsupported_media(
                platform,
                format!("unknown format {}/{}", platform, post_type),
            )
        })?;

        let attempt_dir = tempfile::Builder::new()
            .prefix("attempt-")
            .tempdir_in(&ctx.dir)?;

        let media = match &ctx.media {
            Some(source) => Some(
                self.prepare_media(ctx, source, spec, attempt_dir.path(), adapter.needs_public_url())
                    .await?,
            ),
            None => None,
        };

        let draft = ctx.request.caption_for(platform);
        let caption = format_caption(&draft.text, &draft.hashtags, spec.text.as_ref());
        if caption.truncated {
            debug!("{} caption truncated to {} chars", platform, caption.text.chars().count());
        }
        attempt.advance(AttemptState::Formatted);

        if let Err(e) = self.moderation.check_urls(&caption.text) {
            metrics::MODERATION_BLOCKS
                .with_label_values(&[platform.as_str(), "url"])
                .inc();
            return Err(e.into());
        }

        let sampled_frame = match &media {
            Some(m) if m.is_video() && self.moderation.screens_images(platform) => {
                self.moderation_frame(platform, m, attempt_dir.path()).await
            }
            _ => None,
        };
        let image = match &media {
            Some(m) if m.kind == MediaKind::Image => Some(m.path.as_path()),
            _ => sampled_frame.as_deref(),
        };
        match self.moderation.check(platform, &caption.text, image).await {
            Ok(report) => {
                if !report.keyword_hits.is_empty() {
                    debug!(
                        "{} caption keyword hits below threshold: {:?}",
                        platform, report.keyword_hits
                    );
                }
            }
            Err(e) => {
                metrics::MODERATION_BLOCKS
                    .with_label_values(&[platform.as_str(), "moderation"])
                    .inc();
                return Err(e.into());
            }
        }
        attempt.advance(AttemptState::Moderated);

        let post = PreparedPost {
            post_type,
            caption: caption.text,
            title: draft.title.clone(),
            hashtags: caption.hashtags,
            media,
        };

        window.dispatched += 1;
        attempt.advance(AttemptState::Dispatched);

        let started = Instant::now();
        let outcome = adapter.publish(&post).await;
        metrics::ADAPTER_DURATION
            .with_label_values(&[
                platform.as_str(),
                if outcome.is_ok() { "succeeded" } else { "failed" },
            ])
            .observe(started.elapsed().as_secs_f64());

        drop(attempt_dir);
        outcome.map_err(AttemptError::from)
    }

    /// Renders the batch media for one format and validates the output.
    async fn prepare_media(
        &self,
        ctx: &BatchContext<'_>,
        source: &BatchMedia,
        spec: &PlatformFormatSpec,
        dir: &Path,
        needs_public_url: bool,
    ) -> Result<PreparedMedia, AttemptError> {
        let platform = spec.platform;
        let descriptor = &source.descriptor;
        let ratio = spec
            .target_ratio()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:{}", descriptor.width, descriptor.height));
        let strategy = ctx
            .request
            .crop_strategy
            .unwrap_or(self.config.crop_strategy);
        let stem = format!("{}-{}", platform, spec.post_type);

        let started = Instant::now();
        let converted = if descriptor.is_video() {
            let video = spec.video.as_ref().ok_or_else(|| {
                AttemptError::unsupported_media(
                    platform,
                    format!("{} does not accept video", spec.display_name),
                )
            })?;
            let (video_codec, audio_codec) = video.codecs.unwrap_or(("h264", "aac"));
            let container = video.containers.first().copied().unwrap_or("mp4");
            let request = VideoConversion {
                ratio,
                video_codec: encoder_for(video_codec).to_string(),
                audio_codec: encoder_for(audio_codec).to_string(),
                container: container.to_string(),
                max_width: self.config.video_max_width,
                strategy,
                max_duration_secs: Some(video.max_duration_secs),
                min_duration_secs: video.min_duration_secs,
            };
            let output = dir.join(format!("{}.{}", stem, container));
            self.converter
                .convert_video(&source.path, &output, &request)
                .await
        } else {
            if spec.image.is_none() {
                return Err(AttemptError::unsupported_media(
                    platform,
                    format!("{} does not accept images", spec.display_name),
                ));
            }
            let request = ImageConversion {
                ratio,
                max_width: self.config.image_max_width,
                format: self.config.image_format,
                quality: self.config.image_quality,
                strategy,
            };
            let output = dir.join(format!("{}.{}", stem, request.format.extension()));
            self.converter
                .convert_image(&source.path, &output, &request)
                .await
        };

        metrics::CONVERSION_DURATION
            .with_label_values(&[
                descriptor.kind.as_str(),
                if converted.is_ok() { "succeeded" } else { "failed" },
            ])
            .observe(started.elapsed().as_secs_f64());
        let converted = converted?;

        let rendered = rendered_descriptor(descriptor, &converted);
        let validation = self
            .formats
            .validate_media(platform, spec.post_type, &rendered);
        if !validation.valid {
            return Err(ValidationError {
                platform,
                post_type: spec.post_type,
                errors: validation.errors,
            }
            .into());
        }

        let thumbnail = if platform == Platform::Youtube && rendered.is_video() {
            self.thumbnail(&converted, dir).await
        } else {
            None
        };

        let public_url = if needs_public_url {
            match &self.host {
                Some(host) => Some(host.host(&converted.output_path).await?),
                None => Some(self.passthrough_url(source, spec)?),
            }
        } else {
            None
        };

        Ok(PreparedMedia {
            path: converted.output_path,
            kind: descriptor.kind,
            width: converted.width,
            height: converted.height,
            duration_secs: converted.duration_secs,
            size_bytes: converted.size_bytes,
            public_url,
            thumbnail,
        })
    }

    /// Without a media host, the remote source URL stands in for the
    /// rendered file only when the source already fits the format as is.
    fn passthrough_url(
        &self,
        source: &BatchMedia,
        spec: &PlatformFormatSpec,
    ) -> Result<String, AttemptError> {
        let descriptor = &source.descriptor;
        let Some(url) = &source.remote_url else {
            return Err(HostingError(format!(
                "{} needs a public URL and no media host is configured",
                spec.platform
            ))
            .into());
        };

        let ratio_fits = match spec.target_ratio() {
            Some(ratio) => parse_ratio(ratio)
                .map(|r| within_ratio_tolerance(descriptor.width, descriptor.height, r))
                .unwrap_or(false),
            None => true,
        };
        let validation = self
            .formats
            .validate_media(spec.platform, spec.post_type, descriptor);
        if !ratio_fits || !validation.valid {
            return Err(HostingError(format!(
                "{} needs a public URL for the converted media and no media host is configured",
                spec.platform
            ))
            .into());
        }

        debug!(
            "Source already fits {}/{}, passing {} through",
            spec.platform, spec.post_type, url
        );
        Ok(url.clone())
    }

    /// Still frame used to screen a video with the image classifier.
    ///
    /// Reuses the cover thumbnail when there is one, otherwise grabs the
    /// middle frame. Extraction failures fail open.
    async fn moderation_frame(
        &self,
        platform: Platform,
        media: &PreparedMedia,
        dir: &Path,
    ) -> Option<PathBuf> {
        if let Some(thumbnail) = &media.thumbnail {
            return Some(thumbnail.clone());
        }

        let offset = media.duration_secs.map(|d| d / 2.0).unwrap_or(0.0);
        let output = dir.join("moderation-frame.jpg");
        match self
            .converter
            .generate_thumbnail(&media.path, &output, offset)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(
                    platform = %platform,
                    error = %e,
                    "Could not sample a video frame, publishing without video moderation"
                );
                metrics::MODERATION_FAIL_OPEN
                    .with_label_values(&[platform.as_str(), "frame"])
                    .inc();
                None
            }
        }
    }

    /// Advisory: a failed thumbnail never fails the attempt.
    async fn thumbnail(&self, video: &ConversionResult, dir: &Path) -> Option<PathBuf> {
        let mut offset = self.config.thumbnail_offset_secs.max(0.0);
        if let Some(duration) = video.duration_secs {
            if offset >= duration {
                offset = duration / 2.0;
            }
        }

        let output = dir.join("thumbnail.jpg");
        match self
            .converter
            .generate_thumbnail(&video.output_path, &output, offset)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Thumbnail generation failed, publishing without one: {}", e);
                metrics::THUMBNAIL_FAILURES.inc();
                None
            }
        }
    }

    fn record(&self, batch_id: &str, result: &PublishAttemptResult) {
        let record = PublishRecord {
            id: uuid::Uuid::new_v4().to_string(),
            batch_id: batch_id.to_string(),
            platform: result.platform,
            post_type: result.post_type,
            success: result.success,
            remote_id: result.remote_id.clone(),
            remote_url: result.remote_url.clone(),
            error_message: result.error_message.clone(),
            attempted_at: Utc::now(),
        };
        if let Err(e) = self.store.record_attempt(&record) {
            warn!(
                "Failed to record {} attempt for batch {}: {}",
                result.platform, batch_id, e
            );
        }
    }
}

fn cancel_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    match shutdown.try_recv() {
        Ok(()) | Err(TryRecvError::Lagged(_)) => true,
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
    }
}

/// FFmpeg encoder for a codec name from the format table.
fn encoder_for(codec: &str) -> &str {
    match codec {
        "h264" => "libx264",
        "h265" | "hevc" => "libx265",
        "vp9" => "libvpx-vp9",
        "opus" => "libopus",
        other => other,
    }
}

/// Descriptor of a rendered file, from the conversion result.
fn rendered_descriptor(source: &MediaDescriptor, converted: &ConversionResult) -> MediaDescriptor {
    MediaDescriptor {
        path: converted.output_path.clone(),
        kind: source.kind,
        width: converted.width,
        height: converted.height,
        duration_secs: converted.duration_secs,
        size_bytes: converted.size_bytes,
        codec: source.codec.clone(),
        container_format: source.container_format.clone(),
        frame_rate: source.frame_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_for() {
        assert_eq!(encoder_for("h264"), "libx264");
        assert_eq!(encoder_for("aac"), "aac");
        assert_eq!(encoder_for("hevc"), "libx265");
    }

    #[test]
    fn test_cancel_requested() {
        let (tx, mut rx) = broadcast::channel(1);
        assert!(!cancel_requested(&mut rx));
        tx.send(()).unwrap();
        assert!(cancel_requested(&mut rx));
        assert!(!cancel_requested(&mut rx));
    }

    #[test]
    fn test_rendered_descriptor_takes_output_geometry() {
        let source = MediaDescriptor {
            path: "/in.mov".into(),
            kind: MediaKind::Video,
            width: 1920,
            height: 1080,
            duration_secs: Some(120.0),
            size_bytes: 50_000_000,
            codec: "h264".to_string(),
            container_format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            frame_rate: Some(30.0),
        };
        let converted = ConversionResult {
            output_path: "/out/tiktok-video.mp4".into(),
            width: 608,
            height: 1080,
            duration_secs: Some(60.0),
            size_bytes: 9_000_000,
            elapsed_ms: 1200,
        };
        let rendered = rendered_descriptor(&source, &converted);
        assert_eq!(rendered.width, 608);
        assert_eq!(rendered.duration_secs, Some(60.0));
        assert_eq!(rendered.size_bytes, 9_000_000);
        assert_eq!(rendered.path, PathBuf::from("/out/tiktok-video.mp4"));
        assert_eq!(rendered.frame_rate, Some(30.0));
    }

    fn passthrough_publisher() -> Publisher {
        Publisher::new(
            PublisherConfig::default(),
            Arc::new(crate::testing::MockConverter::new()),
            AdapterRegistry::new(),
            Arc::new(crate::history::MemoryRateLimitStore::new()),
            ModerationGate::new(crate::moderation::ModerationConfig::default(), None),
        )
        .unwrap()
    }

    fn remote_video(width: u32, height: u32, duration: f64) -> BatchMedia {
        let mut descriptor = crate::testing::fixtures::video_descriptor("/work/source.mp4", duration);
        descriptor.width = width;
        descriptor.height = height;
        BatchMedia {
            path: "/work/source.mp4".into(),
            remote_url: Some("https://origin.example/clip.mp4".to_string()),
            descriptor,
        }
    }

    #[test]
    fn test_passthrough_only_for_conforming_source() {
        let publisher = passthrough_publisher();
        let reel = FormatRegistry::builtin()
            .get(Platform::Instagram, PostType::Reel)
            .unwrap();

        let vertical = remote_video(1080, 1920, 30.0);
        assert_eq!(
            publisher.passthrough_url(&vertical, reel).unwrap(),
            "https://origin.example/clip.mp4"
        );

        let landscape = remote_video(1920, 1080, 30.0);
        assert!(matches!(
            publisher.passthrough_url(&landscape, reel),
            Err(AttemptError::Hosting(_))
        ));

        let too_long = remote_video(1080, 1920, 300.0);
        assert!(matches!(
            publisher.passthrough_url(&too_long, reel),
            Err(AttemptError::Hosting(_))
        ));

        let mut local = remote_video(1080, 1920, 30.0);
        local.remote_url = None;
        assert!(matches!(
            publisher.passthrough_url(&local, reel),
            Err(AttemptError::Hosting(_))
        ));
    }
}
