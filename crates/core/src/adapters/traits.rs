//! Platform adapter trait.

use async_trait::async_trait;

use super::error::PublishError;
use super::types::{PreparedPost, PublishReceipt};
use crate::formats::Platform;

/// A client for one platform's publishing API.
///
/// Implementations perform exactly one publish per call and never retry;
/// retry and pacing policy belong to the caller.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Platform this adapter publishes to.
    fn platform(&self) -> Platform;

    /// Whether the platform fetches media by URL instead of by upload.
    fn needs_public_url(&self) -> bool {
        false
    }

    /// Publish a post, returning the platform's identifier for it.
    async fn publish(&self, post: &PreparedPost) -> Result<PublishReceipt, PublishError>;
}
