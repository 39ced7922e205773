//! Publish history storage trait and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formats::{Platform, PostType};

/// Error type for history storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
    /// Stored row could not be decoded.
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// One persisted publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub id: String,
    /// Batch the attempt belonged to.
    pub batch_id: String,
    pub platform: Platform,
    pub post_type: Option<PostType>,
    pub success: bool,
    pub remote_id: Option<String>,
    pub remote_url: Option<String>,
    pub error_message: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl PublishRecord {
    /// A bare successful publish, as seen by the rate window.
    pub fn success(platform: Platform, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            batch_id: String::new(),
            platform,
            post_type: None,
            success: true,
            remote_id: None,
            remote_url: None,
            error_message: None,
            attempted_at: at,
        }
    }
}

/// Filter for listing history.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub platform: Option<Platform>,
    pub since: Option<DateTime<Utc>>,
    /// Only successful (`Some(true)`) or failed (`Some(false)`) attempts.
    pub success: Option<bool>,
    pub limit: usize,
}

/// Persistent record of publish attempts.
///
/// Rate windows are derived from it: only successful attempts count toward
/// [`count_since`](RateLimitStore::count_since).
pub trait RateLimitStore: Send + Sync {
    /// Records a successful publish on `platform` at `at`.
    fn record(&self, platform: Platform, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.record_attempt(&PublishRecord::success(platform, at))
    }

    /// Records a full attempt, successful or not.
    fn record_attempt(&self, record: &PublishRecord) -> Result<(), StoreError>;

    /// Successful publishes since `since`, for one platform or all of them.
    fn count_since(
        &self,
        platform: Option<Platform>,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Most recent attempts first.
    fn list(&self, filter: &HistoryFilter) -> Result<Vec<PublishRecord>, StoreError>;
}
