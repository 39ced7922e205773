//! Built-in platform format table.

use super::types::{
    ImageSpec, Platform, PlatformFormatSpec, PostType, Resolution, TextSpec, VideoSpec,
};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

const H264_AAC: Option<(&str, &str)> = Some(("h264", "aac"));

fn res(width: u32, height: u32) -> Option<Resolution> {
    Some(Resolution { width, height })
}

fn text(max_length: usize) -> Option<TextSpec> {
    Some(TextSpec {
        max_length,
        max_hashtags: None,
        title_max_length: None,
    })
}

fn text_with_hashtags(max_length: usize, max_hashtags: usize) -> Option<TextSpec> {
    Some(TextSpec {
        max_length,
        max_hashtags: Some(max_hashtags),
        title_max_length: None,
    })
}

fn youtube_text(description: usize) -> Option<TextSpec> {
    Some(TextSpec {
        max_length: description,
        max_hashtags: None,
        title_max_length: Some(100),
    })
}

fn spec(platform: Platform, post_type: PostType, display_name: &'static str) -> PlatformFormatSpec {
    PlatformFormatSpec {
        platform,
        post_type,
        display_name,
        allowed_ratios: &[],
        video: None,
        image: None,
        text: None,
        optimal: false,
        ephemeral: false,
    }
}

/// Every built-in format, grouped by platform in registry order.
pub(super) fn builtin_specs() -> Vec<PlatformFormatSpec> {
    vec![
        // Facebook
        PlatformFormatSpec {
            allowed_ratios: &["16:9", "1:1", "4:5"],
            video: Some(VideoSpec {
                max_duration_secs: 14_400.0,
                min_duration_secs: None,
                max_size_bytes: 10 * GB,
                containers: &["mp4", "mov"],
                codecs: H264_AAC,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            image: Some(ImageSpec {
                max_size_bytes: Some(8 * MB),
                formats: &["jpg", "png"],
                min_resolution: None,
                max_resolution: None,
            }),
            text: text(63_206),
            ..spec(Platform::Facebook, PostType::Post, "Post Standard")
        },
        PlatformFormatSpec {
            allowed_ratios: &["9:16"],
            video: Some(VideoSpec {
                max_duration_secs: 90.0,
                min_duration_secs: Some(3.0),
                max_size_bytes: 4 * GB,
                containers: &["mp4"],
                codecs: H264_AAC,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            text: text(2_200),
            optimal: true,
            ..spec(Platform::Facebook, PostType::Reel, "Reel")
        },
        PlatformFormatSpec {
            allowed_ratios: &["9:16"],
            video: Some(VideoSpec {
                max_duration_secs: 60.0,
                min_duration_secs: None,
                max_size_bytes: 4 * GB,
                containers: &["mp4"],
                codecs: None,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            ephemeral: true,
            ..spec(Platform::Facebook, PostType::Story, "Story")
        },
        // Instagram
        PlatformFormatSpec {
            allowed_ratios: &["1:1", "4:5"],
            video: Some(VideoSpec {
                max_duration_secs: 60.0,
                min_duration_secs: Some(3.0),
                max_size_bytes: 100 * MB,
                containers: &["mp4"],
                codecs: H264_AAC,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            image: Some(ImageSpec {
                max_size_bytes: Some(8 * MB),
                formats: &["jpg", "png"],
                min_resolution: res(320, 320),
                max_resolution: res(1440, 1800),
            }),
            text: text_with_hashtags(2_200, 30),
            ..spec(Platform::Instagram, PostType::Feed, "Feed Post")
        },
        PlatformFormatSpec {
            allowed_ratios: &["9:16"],
            video: Some(VideoSpec {
                max_duration_secs: 90.0,
                min_duration_secs: Some(3.0),
                max_size_bytes: 4 * GB,
                containers: &["mp4"],
                codecs: H264_AAC,
                min_resolution: res(540, 960),
                max_resolution: None,
                recommended_resolution: res(1080, 1920),
            }),
            text: text_with_hashtags(2_200, 30),
            optimal: true,
            ..spec(Platform::Instagram, PostType::Reel, "Reel")
        },
        PlatformFormatSpec {
            allowed_ratios: &["9:16"],
            video: Some(VideoSpec {
                max_duration_secs: 60.0,
                min_duration_secs: None,
                max_size_bytes: 4 * GB,
                containers: &["mp4"],
                codecs: None,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            ephemeral: true,
            ..spec(Platform::Instagram, PostType::Story, "Story")
        },
        PlatformFormatSpec {
            allowed_ratios: &["1:1", "4:5"],
            video: Some(VideoSpec {
                max_duration_secs: 60.0,
                min_duration_secs: None,
                max_size_bytes: 100 * MB,
                containers: &["mp4"],
                codecs: None,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            image: Some(ImageSpec {
                max_size_bytes: Some(8 * MB),
                formats: &["jpg", "png"],
                min_resolution: None,
                max_resolution: None,
            }),
            ..spec(Platform::Instagram, PostType::Carousel, "Carousel")
        },
        // Twitter
        PlatformFormatSpec {
            allowed_ratios: &["16:9", "1:1", "2:1", "3:4"],
            video: Some(VideoSpec {
                max_duration_secs: 140.0,
                min_duration_secs: None,
                max_size_bytes: 512 * MB,
                containers: &["mp4", "mov"],
                codecs: H264_AAC,
                min_resolution: res(32, 32),
                max_resolution: res(1920, 1200),
                recommended_resolution: None,
            }),
            image: Some(ImageSpec {
                max_size_bytes: Some(5 * MB),
                formats: &["jpg", "png", "gif"],
                min_resolution: None,
                max_resolution: None,
            }),
            text: text(280),
            optimal: true,
            ..spec(Platform::Twitter, PostType::Tweet, "Tweet")
        },
        // LinkedIn
        PlatformFormatSpec {
            allowed_ratios: &["1.91:1", "1:1", "4:5"],
            video: Some(VideoSpec {
                max_duration_secs: 600.0,
                min_duration_secs: Some(3.0),
                max_size_bytes: 5 * GB,
                containers: &["mp4", "mov", "avi"],
                codecs: None,
                min_resolution: res(256, 144),
                max_resolution: res(4096, 2304),
                recommended_resolution: None,
            }),
            image: Some(ImageSpec {
                max_size_bytes: None,
                formats: &["jpg", "png", "gif"],
                min_resolution: res(552, 368),
                max_resolution: None,
            }),
            text: text(3_000),
            optimal: true,
            ..spec(Platform::Linkedin, PostType::Post, "Post Standard")
        },
        PlatformFormatSpec {
            text: text(125_000),
            ..spec(Platform::Linkedin, PostType::Article, "Article")
        },
        spec(Platform::Linkedin, PostType::Document, "Document Post"),
        // TikTok
        PlatformFormatSpec {
            allowed_ratios: &["9:16"],
            video: Some(VideoSpec {
                max_duration_secs: 600.0,
                min_duration_secs: Some(3.0),
                // 287.6 MB
                max_size_bytes: 2876 * MB / 10,
                containers: &["mp4", "mov", "webm"],
                codecs: H264_AAC,
                min_resolution: res(540, 960),
                max_resolution: None,
                recommended_resolution: res(1080, 1920),
            }),
            text: text_with_hashtags(150, 10),
            optimal: true,
            ..spec(Platform::Tiktok, PostType::Video, "Video")
        },
        // YouTube
        PlatformFormatSpec {
            allowed_ratios: &["16:9", "4:3", "1:1"],
            video: Some(VideoSpec {
                max_duration_secs: 43_200.0,
                min_duration_secs: Some(1.0),
                max_size_bytes: 256 * GB,
                containers: &["mp4", "mov", "avi", "wmv", "flv", "webm"],
                codecs: H264_AAC,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: res(1920, 1080),
            }),
            text: youtube_text(5_000),
            ..spec(Platform::Youtube, PostType::Video, "Video Standard")
        },
        PlatformFormatSpec {
            allowed_ratios: &["9:16"],
            video: Some(VideoSpec {
                max_duration_secs: 60.0,
                min_duration_secs: Some(1.0),
                max_size_bytes: 256 * GB,
                containers: &["mp4"],
                codecs: None,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: res(1080, 1920),
            }),
            text: youtube_text(5_000),
            optimal: true,
            ..spec(Platform::Youtube, PostType::Short, "Short")
        },
        PlatformFormatSpec {
            allowed_ratios: &["16:9"],
            video: Some(VideoSpec {
                max_duration_secs: 43_200.0,
                min_duration_secs: None,
                max_size_bytes: 256 * GB,
                containers: &["mp4"],
                codecs: None,
                min_resolution: None,
                max_resolution: None,
                recommended_resolution: None,
            }),
            text: youtube_text(5_000),
            ..spec(Platform::Youtube, PostType::Unlisted, "Unlisted Video")
        },
    ]
}
