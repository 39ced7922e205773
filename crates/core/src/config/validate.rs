use super::{types::Config, ConfigError};

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration
/// Currently validates:
/// - Database path is set
/// - Converter timeout is positive and CRF is in the x264 range
/// - Rate window and caps are positive
/// - Render widths can hold an even dimension, image quality is 1-100
/// - Moderation threshold and classifier timeout are positive
/// - Platform HTTP timeout is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.database.path.as_os_str().is_empty() {
        return Err(invalid("database.path cannot be empty"));
    }

    // Converter validation
    if config.converter.timeout_secs == 0 {
        return Err(invalid("converter.timeout_secs must be positive"));
    }
    if config.converter.crf > 51 {
        return Err(invalid("converter.crf must be between 0 and 51"));
    }

    // Publisher validation
    let publisher = &config.publisher;
    if publisher.rate_limit.window_secs == 0 {
        return Err(invalid("publisher.rate_limit.window_secs must be positive"));
    }
    if publisher.rate_limit.per_platform_max == 0 || publisher.rate_limit.global_max == 0 {
        return Err(invalid("publisher.rate_limit maxima must be positive"));
    }
    if publisher.video_max_width < 2 || publisher.image_max_width < 2 {
        return Err(invalid("publisher max widths must be at least 2"));
    }
    if !(1..=100).contains(&publisher.image_quality) {
        return Err(invalid("publisher.image_quality must be between 1 and 100"));
    }
    if !publisher.thumbnail_offset_secs.is_finite() || publisher.thumbnail_offset_secs < 0.0 {
        return Err(invalid("publisher.thumbnail_offset_secs must be non-negative"));
    }

    // Moderation validation
    if config.moderation.text_block_threshold == 0 {
        return Err(invalid("moderation.text_block_threshold must be positive"));
    }
    if config.moderation.classifier_timeout_ms == 0 {
        return Err(invalid("moderation.classifier_timeout_ms must be positive"));
    }

    if config.platforms.http_timeout_secs == 0 {
        return Err(invalid("platforms.http_timeout_secs must be positive"));
    }

    Ok(())
}
