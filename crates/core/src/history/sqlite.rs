//! SQLite-backed history store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::store::{HistoryFilter, PublishRecord, RateLimitStore, StoreError};
use crate::formats::{Platform, PostType};

/// SQLite-backed history store.
pub struct SqliteRateLimitStore {
    conn: Mutex<Connection>,
}

impl SqliteRateLimitStore {
    /// Create a new SQLite store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS publish_attempts (
                id TEXT PRIMARY KEY,
                batch_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                post_type TEXT,
                success INTEGER NOT NULL,
                remote_id TEXT,
                remote_url TEXT,
                error_message TEXT,
                attempted_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_publish_attempts_window
                ON publish_attempts(success, attempted_at);
            CREATE INDEX IF NOT EXISTS idx_publish_attempts_platform
                ON publish_attempts(platform, attempted_at);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    /// Timestamps are stored as fixed-width RFC 3339 so string order is time order.
    fn format_time(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<(PublishRecord, Option<String>)> {
        let id: String = row.get(0)?;
        let batch_id: String = row.get(1)?;
        let platform_str: String = row.get(2)?;
        let post_type_str: Option<String> = row.get(3)?;
        let success: bool = row.get(4)?;
        let remote_id: Option<String> = row.get(5)?;
        let remote_url: Option<String> = row.get(6)?;
        let error_message: Option<String> = row.get(7)?;
        let attempted_at_str: String = row.get(8)?;

        let mut problem = None;

        let platform = match Platform::parse(&platform_str) {
            Some(p) => p,
            None => {
                problem = Some(format!("unknown platform {}", platform_str));
                Platform::Facebook
            }
        };

        let post_type = post_type_str.and_then(|s| {
            serde_json::from_value::<PostType>(serde_json::Value::String(s)).ok()
        });

        let attempted_at = match DateTime::parse_from_rfc3339(&attempted_at_str) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                problem = Some(format!("bad timestamp {}: {}", attempted_at_str, e));
                Utc::now()
            }
        };

        Ok((
            PublishRecord {
                id,
                batch_id,
                platform,
                post_type,
                success,
                remote_id,
                remote_url,
                error_message,
                attempted_at,
            },
            problem,
        ))
    }
}

impl RateLimitStore for SqliteRateLimitStore {
    fn record_attempt(&self, record: &PublishRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO publish_attempts
                (id, batch_id, platform, post_type, success, remote_id, remote_url, error_message, attempted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.batch_id,
                record.platform.as_str(),
                record.post_type.map(|t| t.as_str()),
                record.success,
                record.remote_id,
                record.remote_url,
                record.error_message,
                Self::format_time(record.attempted_at),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn count_since(
        &self,
        platform: Option<Platform>,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let since = Self::format_time(since);

        let count: i64 = match platform {
            Some(p) => conn.query_row(
                "SELECT COUNT(*) FROM publish_attempts WHERE success = 1 AND platform = ?1 AND attempted_at >= ?2",
                params![p.as_str(), since],
                |row| row.get(0),
            ),
            None => conn.query_row(
                "SELECT COUNT(*) FROM publish_attempts WHERE success = 1 AND attempted_at >= ?1",
                params![since],
                |row| row.get(0),
            ),
        }
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count.max(0) as u64)
    }

    fn list(&self, filter: &HistoryFilter) -> Result<Vec<PublishRecord>, StoreError> {
        let conn = self.lock()?;

        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(platform) = filter.platform {
            conditions.push("platform = ?");
            values.push(Box::new(platform.as_str().to_string()));
        }
        if let Some(since) = filter.since {
            conditions.push("attempted_at >= ?");
            values.push(Box::new(Self::format_time(since)));
        }
        if let Some(success) = filter.success {
            conditions.push("success = ?");
            values.push(Box::new(success));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = if filter.limit > 0 {
            format!("LIMIT {}", filter.limit)
        } else {
            String::new()
        };

        let sql = format!(
            "SELECT id, batch_id, platform, post_type, success, remote_id, remote_url, error_message, attempted_at \
             FROM publish_attempts {} ORDER BY attempted_at DESC {}",
            where_clause, limit_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt
            .query_map(params.as_slice(), Self::row_to_record)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (record, problem) = row.map_err(|e| StoreError::Database(e.to_string()))?;
            if let Some(reason) = problem {
                return Err(StoreError::Corrupt {
                    id: record.id,
                    reason,
                });
            }
            records.push(record);
        }

        Ok(records)
    }
}
