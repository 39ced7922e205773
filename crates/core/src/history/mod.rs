//! Publish history.
//!
//! Every publish attempt is recorded here. Rate-limit windows are derived by
//! counting successful records inside a trailing time window.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryRateLimitStore;
pub use sqlite::SqliteRateLimitStore;
pub use store::{HistoryFilter, PublishRecord, RateLimitStore, StoreError};
