pub mod adapters;
pub mod config;
pub mod converter;
pub mod formats;
pub mod history;
pub mod metrics;
pub mod moderation;
pub mod publisher;
pub mod testing;

pub use adapters::{build_adapters, AdapterRegistry, PlatformAdapter, PlatformsConfig, PublishError};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use converter::{Converter, ConverterConfig, ConverterError, FfmpegConverter};
pub use formats::{FormatRegistry, Platform, PostType};
pub use history::{
    HistoryFilter, MemoryRateLimitStore, PublishRecord, RateLimitStore, SqliteRateLimitStore,
    StoreError,
};
pub use moderation::{ImageClassifier, ModerationConfig, ModerationGate, VisionClassifier};
pub use publisher::{
    MediaSource, PublishBatchResult, PublishRequest, Publisher, PublisherConfig, PublisherError,
};
