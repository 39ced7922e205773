//! In-memory history store.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::store::{HistoryFilter, PublishRecord, RateLimitStore, StoreError};
use crate::formats::Platform;

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    records: RwLock<Vec<PublishRecord>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, oldest first.
    pub fn records(&self) -> Vec<PublishRecord> {
        self.records
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn lock_error() -> StoreError {
        StoreError::Database("history lock poisoned".to_string())
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn record_attempt(&self, record: &PublishRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| Self::lock_error())?
            .push(record.clone());
        Ok(())
    }

    fn count_since(
        &self,
        platform: Option<Platform>,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let records = self.records.read().map_err(|_| Self::lock_error())?;
        Ok(records
            .iter()
            .filter(|r| r.success && r.attempted_at >= since)
            .filter(|r| platform.is_none_or(|p| r.platform == p))
            .count() as u64)
    }

    fn list(&self, filter: &HistoryFilter) -> Result<Vec<PublishRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::lock_error())?;
        let mut matching: Vec<PublishRecord> = records
            .iter()
            .filter(|r| filter.platform.is_none_or(|p| r.platform == p))
            .filter(|r| filter.since.is_none_or(|s| r.attempted_at >= s))
            .filter(|r| filter.success.is_none_or(|s| r.success == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        if filter.limit > 0 {
            matching.truncate(filter.limit);
        }
        Ok(matching)
    }
}
