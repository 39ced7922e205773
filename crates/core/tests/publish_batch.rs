//! Publish batch integration tests.
//!
//! These tests drive `Publisher::publish_batch` end to end with mock
//! converter, adapters and classifier:
//! rate check -> pacing -> render -> caption -> moderation -> dispatch

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tempfile::TempDir;

use spreadit_core::{
    adapters::{AdapterRegistry, PlatformAdapter},
    formats::{Platform, PostType},
    history::{HistoryFilter, MemoryRateLimitStore, RateLimitStore},
    moderation::{ImageClassifier, ModerationConfig, ModerationGate, SafetyAnnotation},
    publisher::{
        AttemptState, CaptionDraft, MediaSource, PacingConfig, PublishRequest, Publisher,
        PublisherConfig, PublisherError,
    },
    testing::{fixtures, MockAdapter, MockClassifier, MockConverter, MockMediaHost},
    ConverterError,
};

/// Test helper wiring a publisher to mocks.
struct TestHarness {
    converter: Arc<MockConverter>,
    store: Arc<MemoryRateLimitStore>,
    adapters: Vec<Arc<MockAdapter>>,
    work_dir: TempDir,
    source_dir: TempDir,
}

impl TestHarness {
    fn new(platforms: &[Platform]) -> Self {
        Self {
            converter: Arc::new(MockConverter::new()),
            store: Arc::new(MemoryRateLimitStore::new()),
            adapters: platforms
                .iter()
                .map(|p| Arc::new(MockAdapter::new(*p)))
                .collect(),
            work_dir: TempDir::new().expect("Failed to create work dir"),
            source_dir: TempDir::new().expect("Failed to create source dir"),
        }
    }

    fn adapter(&self, platform: Platform) -> Arc<MockAdapter> {
        self.adapters
            .iter()
            .find(|a| a.platform() == platform)
            .cloned()
            .expect("adapter not registered")
    }

    fn config(&self) -> PublisherConfig {
        PublisherConfig::default()
            .with_work_dir(self.work_dir.path())
            .with_pacing(PacingConfig::none())
    }

    fn publisher(&self) -> Publisher {
        self.publisher_with(self.config(), ModerationGate::new(ModerationConfig::default(), None))
    }

    fn publisher_with(&self, config: PublisherConfig, gate: ModerationGate) -> Publisher {
        let mut registry = AdapterRegistry::new();
        for adapter in &self.adapters {
            registry.register(adapter.clone());
        }
        Publisher::new(
            config,
            self.converter.clone(),
            registry,
            self.store.clone(),
            gate,
        )
        .expect("Failed to create publisher")
    }

    fn video(&self) -> MediaSource {
        MediaSource::Path(fixtures::source_file(self.source_dir.path(), "clip.mp4"))
    }

    fn image(&self) -> MediaSource {
        MediaSource::Path(fixtures::source_file(self.source_dir.path(), "photo.jpg"))
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_publishing_remaining_platforms() {
    let platforms = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Linkedin,
    ];
    let harness = TestHarness::new(&platforms);
    let request = PublishRequest::new(CaptionDraft::new("Launch day"), platforms.to_vec())
        .with_media(harness.video())
        .with_caption_for(
            Platform::Instagram,
            CaptionDraft::new("nsfw and explicit preview"),
        );

    let result = harness.publisher().publish_batch(&request).await.unwrap();

    assert!(!result.overall_success);
    assert_eq!(result.attempts.len(), 4);
    assert_eq!(result.succeeded_count(), 3);

    let order: Vec<Platform> = result.attempts.iter().map(|a| a.platform).collect();
    assert_eq!(order, platforms.to_vec());

    let instagram = result.attempt(Platform::Instagram).unwrap();
    assert!(!instagram.success);
    assert_eq!(instagram.failed_at, Some(AttemptState::Formatted));
    assert!(instagram
        .error_message
        .as_deref()
        .unwrap()
        .contains("moderation blocked"));
    assert_eq!(harness.adapter(Platform::Instagram).call_count().await, 0);

    for platform in [Platform::Facebook, Platform::Twitter, Platform::Linkedin] {
        let attempt = result.attempt(platform).unwrap();
        assert!(attempt.success, "{} should succeed", platform);
        assert_eq!(attempt.remote_id.as_deref(), Some(format!("{}-1", platform).as_str()));
    }

    let recorded = harness
        .store
        .list(&HistoryFilter::default())
        .unwrap();
    assert_eq!(recorded.len(), 4);
    assert!(recorded.iter().all(|r| r.batch_id == result.batch_id));
}

#[tokio::test]
async fn test_platform_rate_limit_blocks_before_dispatch() {
    let harness = TestHarness::new(&[Platform::Facebook]);
    let now = Utc::now();
    for minutes in [5, 20, 40] {
        harness
            .store
            .record(Platform::Facebook, now - ChronoDuration::minutes(minutes))
            .unwrap();
    }

    let request = PublishRequest::new(CaptionDraft::new("Fourth post"), vec![Platform::Facebook]);
    let result = harness.publisher().publish_batch(&request).await.unwrap();

    let attempt = result.attempt(Platform::Facebook).unwrap();
    assert!(!attempt.success);
    assert_eq!(attempt.failed_at, Some(AttemptState::Pending));
    assert!(attempt
        .error_message
        .as_deref()
        .unwrap()
        .contains("rate limit exceeded"));
    assert_eq!(harness.adapter(Platform::Facebook).call_count().await, 0);
    assert_eq!(harness.converter.conversion_count().await, 0);
}

#[tokio::test]
async fn test_global_cap_counts_this_batch() {
    let harness = TestHarness::new(&[Platform::Linkedin, Platform::Tiktok]);
    let now = Utc::now();
    for (platform, minutes) in [
        (Platform::Facebook, 5),
        (Platform::Facebook, 10),
        (Platform::Twitter, 15),
        (Platform::Twitter, 25),
    ] {
        harness
            .store
            .record(platform, now - ChronoDuration::minutes(minutes))
            .unwrap();
    }

    let request = PublishRequest::new(
        CaptionDraft::new("Global cap"),
        vec![Platform::Linkedin, Platform::Tiktok],
    );
    let result = harness.publisher().publish_batch(&request).await.unwrap();

    assert!(result.attempt(Platform::Linkedin).unwrap().success);
    let tiktok = result.attempt(Platform::Tiktok).unwrap();
    assert!(!tiktok.success);
    assert!(tiktok.error_message.as_deref().unwrap().contains("global cap"));
    assert_eq!(harness.adapter(Platform::Tiktok).call_count().await, 0);
}

#[tokio::test]
async fn test_workspace_removed_after_batch() {
    let harness = TestHarness::new(&[Platform::Tiktok, Platform::Youtube]);
    let source = harness.video();
    let request = PublishRequest::new(
        CaptionDraft::new("Behind the scenes"),
        vec![Platform::Tiktok, Platform::Youtube],
    )
    .with_media(source.clone());

    let result = harness.publisher().publish_batch(&request).await.unwrap();
    assert!(result.overall_success);

    for platform in [Platform::Tiktok, Platform::Youtube] {
        let posts = harness.adapter(platform).posts().await;
        assert_eq!(posts.len(), 1);
        assert!(posts[0].media_present, "{} saw no rendered file", platform);
        let media = posts[0].post.media.as_ref().unwrap();
        assert!(!media.path.exists());
        assert!(media.height > media.width, "{} media should be vertical", platform);
    }

    assert_workspace_empty(&harness);

    // Caller-owned sources are never deleted.
    if let MediaSource::Path(path) = source {
        assert!(path.exists());
    }
}

fn assert_workspace_empty(harness: &TestHarness) {
    let leftovers: Vec<_> = std::fs::read_dir(harness.work_dir.path())
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "workspace not cleaned: {:?}", leftovers);
}

#[tokio::test]
async fn test_workspace_removed_after_failed_conversion() {
    let harness = TestHarness::new(&[Platform::Tiktok, Platform::Twitter]);
    harness
        .converter
        .set_conversion_error(ConverterError::transcode_failed("encoder crashed", None))
        .await;
    let request = PublishRequest::new(
        CaptionDraft::new("Half rendered"),
        vec![Platform::Tiktok, Platform::Twitter],
    )
    .with_media(harness.video());

    let result = harness.publisher().publish_batch(&request).await.unwrap();

    let tiktok = result.attempt(Platform::Tiktok).unwrap();
    assert!(!tiktok.success);
    assert_eq!(tiktok.failed_at, Some(AttemptState::RateChecked));
    assert_eq!(harness.adapter(Platform::Tiktok).call_count().await, 0);
    assert!(result.attempt(Platform::Twitter).unwrap().success);

    let conversions = harness.converter.recorded_conversions().await;
    assert!(!conversions[0].success);
    assert!(!conversions[0].output.exists());
    assert_workspace_empty(&harness);
}

#[tokio::test]
async fn test_workspace_removed_after_adapter_failure() {
    let harness = TestHarness::new(&[Platform::Youtube]);
    harness
        .adapter(Platform::Youtube)
        .set_fail(500, "upload session expired")
        .await;
    let request = PublishRequest::new(CaptionDraft::new("Rejected"), vec![Platform::Youtube])
        .with_media(harness.video());

    let result = harness.publisher().publish_batch(&request).await.unwrap();

    let youtube = result.attempt(Platform::Youtube).unwrap();
    assert!(!youtube.success);
    assert_eq!(youtube.failed_at, Some(AttemptState::Dispatched));

    let posts = harness.adapter(Platform::Youtube).posts().await;
    assert!(posts[0].media_present, "adapter saw no rendered file");
    let media = posts[0].post.media.as_ref().unwrap();
    assert!(!media.path.exists());
    if let Some(thumbnail) = &media.thumbnail {
        assert!(!thumbnail.exists());
    }
    assert_workspace_empty(&harness);
}

#[tokio::test]
async fn test_public_url_without_host_fails_attempt() {
    let harness = TestHarness::new(&[Platform::Twitter]);
    let instagram = Arc::new(MockAdapter::new(Platform::Instagram).with_public_url());
    let twitter = harness.adapter(Platform::Twitter);

    let publisher = Publisher::new(
        harness.config(),
        harness.converter.clone(),
        AdapterRegistry::new()
            .with(instagram.clone())
            .with(twitter.clone()),
        harness.store.clone(),
        ModerationGate::new(ModerationConfig::default(), None),
    )
    .unwrap();

    let request = PublishRequest::new(
        CaptionDraft::new("Reel"),
        vec![Platform::Instagram, Platform::Twitter],
    )
    .with_media(harness.video());
    let result = publisher.publish_batch(&request).await.unwrap();

    let attempt = result.attempt(Platform::Instagram).unwrap();
    assert!(!attempt.success);
    assert_eq!(attempt.failed_at, Some(AttemptState::RateChecked));
    assert!(attempt
        .error_message
        .as_deref()
        .unwrap()
        .contains("no media host"));
    assert_eq!(instagram.call_count().await, 0);
    assert!(result.attempt(Platform::Twitter).unwrap().success);
    assert_workspace_empty(&harness);
}

#[tokio::test]
async fn test_twitter_caption_truncated() {
    let harness = TestHarness::new(&[Platform::Twitter, Platform::Facebook]);
    let long_text = "a".repeat(3000);
    let request = PublishRequest::new(
        CaptionDraft::new(long_text.clone()),
        vec![Platform::Twitter, Platform::Facebook],
    )
    .with_post_type(Platform::Facebook, PostType::Post);

    let result = harness.publisher().publish_batch(&request).await.unwrap();
    assert!(result.overall_success);

    let tweet = &harness.adapter(Platform::Twitter).posts().await[0].post;
    assert_eq!(tweet.post_type, PostType::Tweet);
    assert_eq!(tweet.caption.chars().count(), 280);
    assert!(tweet.caption.ends_with("..."));

    let facebook = &harness.adapter(Platform::Facebook).posts().await[0].post;
    assert_eq!(facebook.caption, long_text);
}

#[tokio::test]
async fn test_cancel_during_pacing() {
    let harness = TestHarness::new(&[Platform::Linkedin, Platform::Twitter, Platform::Facebook]);
    let mut config = harness.config();
    config.pacing = PacingConfig {
        default_ms: 30_000,
        per_platform_ms: Default::default(),
    };
    let publisher = Arc::new(harness.publisher_with(
        config,
        ModerationGate::new(ModerationConfig::default(), None),
    ));
    let request = PublishRequest::new(
        CaptionDraft::new("Paced"),
        vec![Platform::Linkedin, Platform::Twitter, Platform::Facebook],
    );

    let runner = Arc::clone(&publisher);
    let handle = tokio::spawn(async move { runner.publish_batch(&request).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    publisher.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("batch did not stop after cancel")
        .unwrap()
        .unwrap();

    assert!(result.attempt(Platform::Linkedin).unwrap().success);
    for platform in [Platform::Twitter, Platform::Facebook] {
        let attempt = result.attempt(platform).unwrap();
        assert!(!attempt.success);
        assert_eq!(attempt.error_message.as_deref(), Some("batch cancelled"));
        assert_eq!(harness.adapter(platform).call_count().await, 0);
    }
}

#[tokio::test]
async fn test_download_failure_is_fatal() {
    let harness = TestHarness::new(&[Platform::Facebook]);
    let request = PublishRequest::new(CaptionDraft::new("Remote"), vec![Platform::Facebook])
        .with_media(MediaSource::Url("http://127.0.0.1:1/clip.mp4".to_string()));

    let err = harness.publisher().publish_batch(&request).await.unwrap_err();
    assert!(matches!(err, PublisherError::Download { .. }));
    assert_eq!(harness.adapter(Platform::Facebook).call_count().await, 0);
    assert!(harness.store.list(&HistoryFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_local_source_is_fatal() {
    let harness = TestHarness::new(&[Platform::Facebook]);
    let request = PublishRequest::new(CaptionDraft::new("Local"), vec![Platform::Facebook])
        .with_media(MediaSource::Path(harness.source_dir.path().join("absent.mp4")));

    let err = harness.publisher().publish_batch(&request).await.unwrap_err();
    assert!(matches!(err, PublisherError::SourceNotFound { .. }));
}

#[tokio::test]
async fn test_classifier_timeout_fails_open() {
    let harness = TestHarness::new(&[Platform::Instagram]);
    let classifier = Arc::new(MockClassifier::new());
    classifier.set_delay(Duration::from_millis(500)).await;
    classifier
        .set_annotation(SafetyAnnotation {
            adult: spreadit_core::moderation::Likelihood::VeryLikely,
            ..Default::default()
        })
        .await;
    let moderation = ModerationConfig {
        classifier_timeout_ms: 50,
        ..Default::default()
    };
    let gate = ModerationGate::new(
        moderation,
        Some(classifier.clone() as Arc<dyn ImageClassifier>),
    );
    let publisher = harness.publisher_with(harness.config(), gate);

    let request = PublishRequest::new(CaptionDraft::new("Portrait"), vec![Platform::Instagram])
        .with_media(harness.image());
    let result = publisher.publish_batch(&request).await.unwrap();

    assert!(result.overall_success);
    assert_eq!(classifier.call_count().await, 1);
}

#[tokio::test]
async fn test_flagged_image_blocked() {
    let harness = TestHarness::new(&[Platform::Instagram, Platform::Twitter]);
    let classifier = Arc::new(MockClassifier::new());
    classifier
        .set_annotation(SafetyAnnotation {
            adult: spreadit_core::moderation::Likelihood::VeryLikely,
            ..Default::default()
        })
        .await;
    let gate = ModerationGate::new(ModerationConfig::default(), Some(classifier));
    let publisher = harness.publisher_with(harness.config(), gate);

    let request = PublishRequest::new(
        CaptionDraft::new("Portrait"),
        vec![Platform::Instagram, Platform::Twitter],
    )
    .with_media(harness.image());
    let result = publisher.publish_batch(&request).await.unwrap();

    assert_eq!(result.failed_count(), 2);
    assert_eq!(harness.adapter(Platform::Instagram).call_count().await, 0);
}

#[tokio::test]
async fn test_flagged_video_frame_blocked() {
    let harness = TestHarness::new(&[Platform::Tiktok]);
    let classifier = Arc::new(MockClassifier::new());
    classifier
        .set_annotation(SafetyAnnotation {
            violence: spreadit_core::moderation::Likelihood::VeryLikely,
            ..Default::default()
        })
        .await;
    let gate = ModerationGate::new(
        ModerationConfig::default(),
        Some(classifier.clone() as Arc<dyn ImageClassifier>),
    );
    let publisher = harness.publisher_with(harness.config(), gate);

    let request = PublishRequest::new(CaptionDraft::new("Stunt"), vec![Platform::Tiktok])
        .with_media(harness.video());
    let result = publisher.publish_batch(&request).await.unwrap();

    let tiktok = result.attempt(Platform::Tiktok).unwrap();
    assert!(!tiktok.success);
    assert_eq!(tiktok.failed_at, Some(AttemptState::Formatted));
    assert!(tiktok.error_message.as_deref().unwrap().contains("violence"));
    assert_eq!(classifier.call_count().await, 1);
    assert_eq!(harness.adapter(Platform::Tiktok).call_count().await, 0);
    assert_workspace_empty(&harness);
}

#[tokio::test]
async fn test_video_frame_failure_fails_open() {
    let harness = TestHarness::new(&[Platform::Tiktok]);
    harness.converter.set_fail_thumbnails(true).await;
    let classifier = Arc::new(MockClassifier::new());
    classifier
        .set_annotation(SafetyAnnotation {
            adult: spreadit_core::moderation::Likelihood::VeryLikely,
            ..Default::default()
        })
        .await;
    let gate = ModerationGate::new(
        ModerationConfig::default(),
        Some(classifier.clone() as Arc<dyn ImageClassifier>),
    );
    let publisher = harness.publisher_with(harness.config(), gate);

    let request = PublishRequest::new(CaptionDraft::new("Stunt"), vec![Platform::Tiktok])
        .with_media(harness.video());
    let result = publisher.publish_batch(&request).await.unwrap();

    assert!(result.overall_success);
    assert_eq!(classifier.call_count().await, 0);
}

#[tokio::test]
async fn test_blocked_url_in_caption() {
    let harness = TestHarness::new(&[Platform::Facebook, Platform::Linkedin]);
    let request = PublishRequest::new(
        CaptionDraft::new("Read more at https://example.com/post"),
        vec![Platform::Facebook, Platform::Linkedin],
    )
    .with_caption_for(
        Platform::Facebook,
        CaptionDraft::new("Deal inside https://bit.ly/3xYz"),
    );

    let result = harness.publisher().publish_batch(&request).await.unwrap();

    let facebook = result.attempt(Platform::Facebook).unwrap();
    assert!(!facebook.success);
    assert!(facebook.error_message.as_deref().unwrap().contains("bit.ly"));
    assert!(result.attempt(Platform::Linkedin).unwrap().success);
}

#[tokio::test]
async fn test_public_url_from_media_host() {
    let platforms = [Platform::Instagram];
    let harness = TestHarness::new(&[]);
    let instagram = Arc::new(MockAdapter::new(Platform::Instagram).with_public_url());
    let host = Arc::new(MockMediaHost::new());

    let publisher = Publisher::new(
        harness.config(),
        harness.converter.clone(),
        AdapterRegistry::new().with(instagram.clone()),
        harness.store.clone(),
        ModerationGate::new(ModerationConfig::default(), None),
    )
    .unwrap()
    .with_media_host(host.clone());

    let request = PublishRequest::new(CaptionDraft::new("Reel"), platforms.to_vec())
        .with_media(harness.video());
    let result = publisher.publish_batch(&request).await.unwrap();
    assert!(result.overall_success);

    let posts = instagram.posts().await;
    let media = posts[0].post.media.as_ref().unwrap();
    assert!(media
        .public_url
        .as_deref()
        .unwrap()
        .starts_with("https://cdn.example/instagram-"));
    assert_eq!(host.hosted().await.len(), 1);
}

#[tokio::test]
async fn test_thumbnail_failure_is_advisory() {
    let harness = TestHarness::new(&[Platform::Youtube]);
    harness.converter.set_fail_thumbnails(true).await;
    let request = PublishRequest::new(CaptionDraft::new("Short"), vec![Platform::Youtube])
        .with_media(harness.video());

    let result = harness.publisher().publish_batch(&request).await.unwrap();
    assert!(result.overall_success);

    let posts = harness.adapter(Platform::Youtube).posts().await;
    assert_eq!(posts[0].post.post_type, PostType::Short);
    assert!(posts[0].post.media.as_ref().unwrap().thumbnail.is_none());
}

#[tokio::test]
async fn test_too_short_video_fails_only_that_platform() {
    let harness = TestHarness::new(&[Platform::Instagram, Platform::Twitter]);
    let source = harness.video();
    if let MediaSource::Path(path) = &source {
        harness
            .converter
            .set_probe_result(path, fixtures::video_descriptor(path, 2.0))
            .await;
    }
    let request = PublishRequest::new(
        CaptionDraft::new("Blink"),
        vec![Platform::Instagram, Platform::Twitter],
    )
    .with_media(source);

    let result = harness.publisher().publish_batch(&request).await.unwrap();

    let instagram = result.attempt(Platform::Instagram).unwrap();
    assert!(!instagram.success);
    assert_eq!(instagram.failed_at, Some(AttemptState::RateChecked));
    assert!(result.attempt(Platform::Twitter).unwrap().success);
}
