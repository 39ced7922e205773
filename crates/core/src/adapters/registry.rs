//! Platform to adapter lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::config::PlatformsConfig;
use super::error::PublishError;
use super::facebook::FacebookAdapter;
use super::instagram::InstagramAdapter;
use super::linkedin::LinkedinAdapter;
use super::tiktok::TiktokAdapter;
use super::traits::PlatformAdapter;
use super::twitter::TwitterAdapter;
use super::youtube::YoutubeAdapter;
use crate::formats::Platform;

/// Adapters keyed by the platform they publish to.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter, replacing any previous one for its platform.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    /// Registered platforms, in a stable order.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.adapters.keys().copied().collect();
        platforms.sort();
        platforms
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

/// Builds HTTP adapters for every platform that has credentials.
pub fn build_adapters(config: &PlatformsConfig) -> Result<AdapterRegistry, PublishError> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let mut registry = AdapterRegistry::new();

    if let Some(cfg) = &config.facebook {
        registry.register(Arc::new(FacebookAdapter::new(cfg.clone(), timeout)?));
    }
    if let Some(cfg) = &config.instagram {
        registry.register(Arc::new(InstagramAdapter::new(cfg.clone(), timeout)?));
    }
    if let Some(cfg) = &config.twitter {
        registry.register(Arc::new(TwitterAdapter::new(cfg.clone(), timeout)?));
    }
    if let Some(cfg) = &config.linkedin {
        registry.register(Arc::new(LinkedinAdapter::new(cfg.clone(), timeout)?));
    }
    if let Some(cfg) = &config.tiktok {
        registry.register(Arc::new(TiktokAdapter::new(cfg.clone(), timeout)?));
    }
    if let Some(cfg) = &config.youtube {
        registry.register(Arc::new(YoutubeAdapter::new(cfg.clone(), timeout)?));
    }

    info!("Registered platform adapters: {:?}", registry.platforms());
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{LinkedinConfig, TiktokConfig};

    #[test]
    fn test_build_only_configured() {
        let config = PlatformsConfig {
            linkedin: Some(LinkedinConfig {
                access_token: "tok".to_string(),
                person_urn: "urn:li:person:abc".to_string(),
                base_url: None,
            }),
            tiktok: Some(TiktokConfig {
                access_token: "tok".to_string(),
                base_url: None,
                privacy_level: "SELF_ONLY".to_string(),
                chunk_size_bytes: 1024,
            }),
            ..Default::default()
        };

        let registry = build_adapters(&config).unwrap();
        assert_eq!(registry.platforms(), vec![Platform::Linkedin, Platform::Tiktok]);
        assert!(registry.get(Platform::Facebook).is_none());
        assert_eq!(
            registry.get(Platform::Tiktok).unwrap().platform(),
            Platform::Tiktok
        );
    }

    #[test]
    fn test_invalid_credentials_fail_build() {
        let config = PlatformsConfig {
            linkedin: Some(LinkedinConfig {
                access_token: String::new(),
                person_urn: "urn:li:person:abc".to_string(),
                base_url: None,
            }),
            ..Default::default()
        };
        let err = build_adapters(&config).unwrap_err();
        assert_eq!(err.platform, Platform::Linkedin);
    }
}
