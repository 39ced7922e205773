//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::ratio::{crop_window, target_dimensions};
use super::traits::Converter;
use super::types::{
    ConversionResult, CropStrategy, Dimensions, ImageConversion, ImageFormat, MediaDescriptor,
    MediaKind, VideoConversion,
};

/// Codecs that only ever describe a single still frame.
const STILL_IMAGE_CODECS: &[&str] = &["mjpeg", "png", "webp", "bmp", "tiff", "gif"];

/// Maximum bytes of ffmpeg stderr kept on failure.
const MAX_STDERR_BYTES: usize = 4096;

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the `-vf` chain that fits the source into `dims`.
    fn build_filter(
        source: &MediaDescriptor,
        ratio: &str,
        dims: Dimensions,
        strategy: CropStrategy,
    ) -> Result<String, ConverterError> {
        match strategy {
            CropStrategy::Crop => {
                let window = crop_window(source.width, source.height, ratio)?;
                Ok(format!(
                    "crop={}:{}:{}:{},scale={}:{},setsar=1",
                    window.width, window.height, window.x, window.y, dims.width, dims.height
                ))
            }
            CropStrategy::Pad => Ok(format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
                w = dims.width,
                h = dims.height
            )),
        }
    }

    /// Builds ffmpeg arguments for video conversion.
    fn build_video_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        request: &VideoConversion,
        source: &MediaDescriptor,
        dims: Dimensions,
    ) -> Result<Vec<String>, ConverterError> {
        let filter = Self::build_filter(source, &request.ratio, dims, request.strategy)?;

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "0:a:0?".to_string(),
            "-vf".to_string(),
            filter,
            "-c:v".to_string(),
            request.video_codec.clone(),
        ];

        // Preset only means something to the x264/x265 family
        if request.video_codec.starts_with("libx26") {
            args.extend(["-preset".to_string(), self.config.preset.clone()]);
        }
        args.extend(["-crf".to_string(), self.config.crf.to_string()]);

        args.extend([
            "-c:a".to_string(),
            request.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
        ]);

        // Truncate, never speed up
        if let (Some(max), Some(duration)) = (request.max_duration_secs, source.duration_secs) {
            if duration > max {
                args.extend(["-t".to_string(), format!("{:.3}", max)]);
            }
        }

        args.extend(["-pix_fmt".to_string(), "yuv420p".to_string()]);

        if matches!(request.container.as_str(), "mp4" | "mov" | "m4v") {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(output_path.to_string_lossy().to_string());

        Ok(args)
    }

    /// Builds ffmpeg arguments for image conversion.
    fn build_image_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        request: &ImageConversion,
        source: &MediaDescriptor,
        dims: Dimensions,
    ) -> Result<Vec<String>, ConverterError> {
        let filter = Self::build_filter(source, &request.ratio, dims, request.strategy)?;

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            filter,
            "-frames:v".to_string(),
            "1".to_string(),
            "-c:v".to_string(),
            request.format.ffmpeg_codec().to_string(),
        ];

        let quality = request.quality.clamp(1, 100);
        match request.format {
            ImageFormat::Jpeg => {
                args.extend(["-q:v".to_string(), jpeg_qscale(quality).to_string()]);
            }
            ImageFormat::Webp => {
                args.extend(["-quality".to_string(), quality.to_string()]);
            }
            ImageFormat::Png => {}
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.push(output_path.to_string_lossy().to_string());

        Ok(args)
    }

    /// Builds ffmpeg arguments for single-frame extraction.
    fn build_thumbnail_args(&self, video: &Path, output: &Path, offset_secs: f64) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{:.3}", offset_secs),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            "scale=1280:720:force_original_aspect_ratio=decrease".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Parses ffprobe JSON output into a MediaDescriptor.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaDescriptor, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            ConverterError::probe_failed(format!("Failed to parse ffprobe output: {}", e))
        })?;

        let stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "video")
            .ok_or_else(|| ConverterError::probe_failed("no video or image stream"))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(ConverterError::probe_failed("stream has no dimensions")),
        };

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown")
            .to_string();
        let codec = stream
            .codec_name
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        let duration = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| *d > 0.0);

        let is_image = format_name == "image2"
            || format_name.ends_with("_pipe")
            || (STILL_IMAGE_CODECS.contains(&codec.as_str()) && duration.is_none());

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let (kind, duration_secs, frame_rate) = if is_image {
            (MediaKind::Image, None, None)
        } else {
            (
                MediaKind::Video,
                duration,
                stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
            )
        };

        Ok(MediaDescriptor {
            path: path.to_path_buf(),
            kind,
            width,
            height,
            duration_secs,
            size_bytes,
            codec,
            container_format: format_name,
            frame_rate,
        })
    }

    fn map_spawn_error(&self, e: std::io::Error, binary: &Path, probe: bool) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            if probe {
                ConverterError::FfprobeNotFound {
                    path: binary.to_path_buf(),
                }
            } else {
                ConverterError::FfmpegNotFound {
                    path: binary.to_path_buf(),
                }
            }
        } else {
            ConverterError::Io(e)
        }
    }

    /// Runs ffmpeg with `args`, collecting stderr and enforcing the timeout.
    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), ConverterError> {
        debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_spawn_error(e, &self.config.ffmpeg_path, false))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::transcode_failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                error_output.push_str(&line);
                error_output.push('\n');
                if error_output.len() > MAX_STDERR_BYTES {
                    let cut = error_output.len() - MAX_STDERR_BYTES;
                    let cut = (cut..error_output.len())
                        .find(|i| error_output.is_char_boundary(*i))
                        .unwrap_or(error_output.len());
                    error_output.drain(..cut);
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(ConverterError::transcode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.trim().is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(ConverterError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }

    async fn ensure_parent(output: &Path) -> Result<(), ConverterError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|_| {
                    ConverterError::OutputDirectoryFailed {
                        path: parent.to_path_buf(),
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Checks the rendered file exists, is non-empty and probes cleanly.
    async fn verify_output(&self, output: &Path) -> Result<MediaDescriptor, ConverterError> {
        let meta = tokio::fs::metadata(output)
            .await
            .map_err(|_| ConverterError::transcode_failed("Output file not created", None))?;
        if meta.len() == 0 {
            return Err(ConverterError::transcode_failed("Output file is empty", None));
        }

        self.probe(output).await.map_err(|e| {
            ConverterError::transcode_failed(format!("Output file is unreadable: {}", e), None)
        })
    }

    async fn require_input(path: &Path) -> Result<(), ConverterError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Maps 1..=100 quality onto ffmpeg's 2..=31 JPEG qscale (lower is better).
fn jpeg_qscale(quality: u8) -> u8 {
    let quality = quality.clamp(1, 100) as u32;
    (2 + (100 - quality) * 29 / 99) as u8
}

/// Parses a frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().ok()?;
            let den = den.parse::<f64>().ok()?;
            if den > 0.0 && num > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => rate.parse::<f64>().ok().filter(|r| *r > 0.0),
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaDescriptor, ConverterError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(ConverterError::probe_failed(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e, &self.config.ffprobe_path, true))?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn convert_video(
        &self,
        input: &Path,
        output: &Path,
        request: &VideoConversion,
    ) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();
        Self::require_input(input).await?;

        let source = self.probe(input).await?;
        if !source.is_video() {
            return Err(ConverterError::transcode_failed(
                "input is a still image, not a video",
                None,
            ));
        }

        if let (Some(min), Some(duration)) = (request.min_duration_secs, source.duration_secs) {
            if duration < min {
                return Err(ConverterError::TooShort {
                    duration_secs: duration,
                    min_secs: min,
                });
            }
        }

        let dims = target_dimensions(source.width, source.height, &request.ratio, request.max_width)?;
        let args = self.build_video_args(input, output, request, &source, dims)?;

        Self::ensure_parent(output).await?;
        self.run_ffmpeg(&args).await?;
        let rendered = self.verify_output(output).await?;

        Ok(ConversionResult {
            output_path: output.to_path_buf(),
            width: rendered.width,
            height: rendered.height,
            duration_secs: rendered.duration_secs,
            size_bytes: rendered.size_bytes,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn convert_image(
        &self,
        input: &Path,
        output: &Path,
        request: &ImageConversion,
    ) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();
        Self::require_input(input).await?;

        let source = self.probe(input).await?;
        let dims = target_dimensions(source.width, source.height, &request.ratio, request.max_width)?;
        let args = self.build_image_args(input, output, request, &source, dims)?;

        Self::ensure_parent(output).await?;
        self.run_ffmpeg(&args).await?;
        let rendered = self.verify_output(output).await?;

        Ok(ConversionResult {
            output_path: output.to_path_buf(),
            width: rendered.width,
            height: rendered.height,
            duration_secs: None,
            size_bytes: rendered.size_bytes,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn generate_thumbnail(
        &self,
        video: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<PathBuf, ConverterError> {
        if !offset_secs.is_finite() || offset_secs < 0.0 {
            return Err(ConverterError::thumbnail_failed(format!(
                "invalid offset {}",
                offset_secs
            )));
        }

        let source = self.probe(video).await?;
        match source.duration_secs {
            Some(duration) if offset_secs >= duration => {
                return Err(ConverterError::thumbnail_failed(format!(
                    "offset {:.2}s is beyond the {:.2}s video",
                    offset_secs, duration
                )));
            }
            None => {
                return Err(ConverterError::thumbnail_failed("source has no duration"));
            }
            _ => {}
        }

        let args = self.build_thumbnail_args(video, output, offset_secs);
        Self::ensure_parent(output).await?;
        self.run_ffmpeg(&args).await.map_err(|e| match e {
            ConverterError::TranscodeFailed { reason, .. } => ConverterError::thumbnail_failed(reason),
            other => other,
        })?;

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(output.to_path_buf()),
            _ => Err(ConverterError::thumbnail_failed("no frame written")),
        }
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e, &self.config.ffmpeg_path, false))?;

        Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e, &self.config.ffprobe_path, true))?;

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_source(width: u32, height: u32, duration: f64) -> MediaDescriptor {
        MediaDescriptor {
            path: PathBuf::from("/input.mov"),
            kind: MediaKind::Video,
            width,
            height,
            duration_secs: Some(duration),
            size_bytes: 10_000_000,
            codec: "h264".to_string(),
            container_format: "mov".to_string(),
            frame_rate: Some(30.0),
        }
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn test_build_video_args_crop_and_truncate() {
        let converter = FfmpegConverter::with_defaults();
        let source = video_source(1920, 1080, 120.0);
        let request = VideoConversion {
            ratio: "9:16".to_string(),
            max_duration_secs: Some(90.0),
            ..Default::default()
        };
        let dims = Dimensions::new(608, 1080);

        let args = converter
            .build_video_args(
                Path::new("/input.mov"),
                Path::new("/output.mp4"),
                &request,
                &source,
                dims,
            )
            .unwrap();

        assert_eq!(
            arg_after(&args, "-vf"),
            Some("crop=608:1080:656:0,scale=608:1080,setsar=1")
        );
        assert_eq!(arg_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(arg_after(&args, "-preset"), Some("medium"));
        assert_eq!(arg_after(&args, "-crf"), Some("23"));
        assert_eq!(arg_after(&args, "-c:a"), Some("aac"));
        assert_eq!(arg_after(&args, "-b:a"), Some("192k"));
        assert_eq!(arg_after(&args, "-t"), Some("90.000"));
        assert_eq!(arg_after(&args, "-pix_fmt"), Some("yuv420p"));
        assert_eq!(arg_after(&args, "-movflags"), Some("+faststart"));
        assert_eq!(args.last().map(|s| s.as_str()), Some("/output.mp4"));
    }

    #[test]
    fn test_build_video_args_short_source_not_truncated() {
        let converter = FfmpegConverter::with_defaults();
        let source = video_source(1080, 1920, 30.0);
        let request = VideoConversion {
            ratio: "9:16".to_string(),
            max_duration_secs: Some(90.0),
            ..Default::default()
        };

        let args = converter
            .build_video_args(
                Path::new("/in.mp4"),
                Path::new("/out.mp4"),
                &request,
                &source,
                Dimensions::new(1080, 1920),
            )
            .unwrap();

        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_build_video_args_pad() {
        let converter = FfmpegConverter::with_defaults();
        let source = video_source(1920, 1080, 10.0);
        let request = VideoConversion {
            ratio: "1:1".to_string(),
            strategy: CropStrategy::Pad,
            ..Default::default()
        };

        let args = converter
            .build_video_args(
                Path::new("/in.mp4"),
                Path::new("/out.mp4"),
                &request,
                &source,
                Dimensions::new(1080, 1080),
            )
            .unwrap();

        let filter = arg_after(&args, "-vf").unwrap();
        assert!(filter.starts_with("scale=1080:1080:force_original_aspect_ratio=decrease"));
        assert!(filter.contains("pad=1080:1080:(ow-iw)/2:(oh-ih)/2"));
    }

    #[test]
    fn test_build_video_args_non_x264_skips_preset() {
        let converter = FfmpegConverter::with_defaults();
        let source = video_source(1920, 1080, 10.0);
        let request = VideoConversion {
            video_codec: "libvpx-vp9".to_string(),
            container: "webm".to_string(),
            ..Default::default()
        };

        let args = converter
            .build_video_args(
                Path::new("/in.mp4"),
                Path::new("/out.webm"),
                &request,
                &source,
                Dimensions::new(1920, 1080),
            )
            .unwrap();

        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
    }

    #[test]
    fn test_build_image_args_jpeg_quality() {
        let converter = FfmpegConverter::with_defaults();
        let mut source = video_source(4000, 3000, 0.0);
        source.kind = MediaKind::Image;
        source.duration_secs = None;
        let request = ImageConversion {
            ratio: "4:5".to_string(),
            quality: 100,
            ..Default::default()
        };

        let args = converter
            .build_image_args(
                Path::new("/in.png"),
                Path::new("/out.jpg"),
                &request,
                &source,
                Dimensions::new(1080, 1350),
            )
            .unwrap();

        assert_eq!(arg_after(&args, "-frames:v"), Some("1"));
        assert_eq!(arg_after(&args, "-c:v"), Some("mjpeg"));
        assert_eq!(arg_after(&args, "-q:v"), Some("2"));
        assert!(arg_after(&args, "-vf").unwrap().starts_with("crop=2400:3000:800:0"));
    }

    #[test]
    fn test_jpeg_qscale_bounds() {
        assert_eq!(jpeg_qscale(100), 2);
        assert_eq!(jpeg_qscale(1), 31);
        assert!(jpeg_qscale(80) > 2 && jpeg_qscale(80) < 31);
    }

    #[test]
    fn test_build_thumbnail_args() {
        let converter = FfmpegConverter::with_defaults();
        let args = converter.build_thumbnail_args(Path::new("/v.mp4"), Path::new("/t.jpg"), 1.5);
        assert_eq!(arg_after(&args, "-ss"), Some("1.500"));
        assert_eq!(
            arg_after(&args, "-vf"),
            Some("scale=1280:720:force_original_aspect_ratio=decrease")
        );
        assert_eq!(arg_after(&args, "-frames:v"), Some("1"));
    }

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "format": {
                "filename": "test.mp4",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "42.5",
                "size": "5000000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "24000/1001"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac"
                }
            ]
        }"#;

        let info = FfmpegConverter::parse_probe_output(Path::new("test.mp4"), json).unwrap();
        assert_eq!(info.kind, MediaKind::Video);
        assert_eq!(info.container_format, "mov");
        assert_eq!(info.codec, "h264");
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.size_bytes, 5_000_000);
        assert!((info.duration_secs.unwrap() - 42.5).abs() < 0.001);
        // 24000/1001 ≈ 23.976
        assert!((info.frame_rate.unwrap() - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_probe_output_image() {
        let json = r#"{
            "format": {
                "filename": "photo.jpg",
                "format_name": "image2",
                "duration": "0.040000",
                "size": "250000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "mjpeg",
                    "width": 4000,
                    "height": 3000,
                    "r_frame_rate": "25/1"
                }
            ]
        }"#;

        let info = FfmpegConverter::parse_probe_output(Path::new("photo.jpg"), json).unwrap();
        assert_eq!(info.kind, MediaKind::Image);
        assert!(info.duration_secs.is_none());
        assert!(info.frame_rate.is_none());
        assert_eq!(info.codec, "mjpeg");
    }

    #[test]
    fn test_parse_probe_output_png_pipe_is_image() {
        let json = r#"{
            "format": {"format_name": "png_pipe", "size": "1000"},
            "streams": [{"codec_type": "video", "codec_name": "png", "width": 10, "height": 20}]
        }"#;
        let info = FfmpegConverter::parse_probe_output(Path::new("a.png"), json).unwrap();
        assert!(info.is_image());
    }

    #[test]
    fn test_parse_probe_output_audio_only_fails() {
        let json = r#"{
            "format": {"format_name": "mp3", "duration": "180.0"},
            "streams": [{"codec_type": "audio", "codec_name": "mp3"}]
        }"#;
        let err = FfmpegConverter::parse_probe_output(Path::new("a.mp3"), json).unwrap_err();
        assert!(matches!(err, ConverterError::ProbeFailed { .. }));
    }

    #[test]
    fn test_parse_probe_output_garbage_fails() {
        let err = FfmpegConverter::parse_probe_output(Path::new("x"), "not json").unwrap_err();
        assert!(matches!(err, ConverterError::ProbeFailed { .. }));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
    }

    #[tokio::test]
    async fn test_probe_missing_file_fails() {
        let converter = FfmpegConverter::with_defaults();
        let err = converter
            .probe(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_convert_missing_input_fails() {
        let converter = FfmpegConverter::with_defaults();
        let err = converter
            .convert_video(
                Path::new("/definitely/not/here.mp4"),
                Path::new("/tmp/out.mp4"),
                &VideoConversion::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_thumbnail_negative_offset_fails() {
        let converter = FfmpegConverter::with_defaults();
        let err = converter
            .generate_thumbnail(Path::new("/v.mp4"), Path::new("/t.jpg"), -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::ThumbnailFailed { .. }));
    }
}
