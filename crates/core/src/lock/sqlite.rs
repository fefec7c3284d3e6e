//! SQLite-backed lock store.
//!
//! Processes sharing the same database file share the same locks. Acquire is a
//! single upsert that only overwrites a row whose expiry has passed, so SQLite's
//! write serialization provides the atomicity.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

use super::{LockError, LockOutcome, LockRequest, LockStore};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed lock store.
pub struct SqliteLockStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLockStore {
    /// Open (or create) the lock database at `path`.
    pub fn new(path: &Path) -> Result<Self, LockError> {
        let conn = Connection::open(path).map_err(map_sqlite_error)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, LockError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, LockError> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sqlite_error)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS locks (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at_ms INTEGER NOT NULL
            );
            "#,
        )
        .map_err(map_sqlite_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn try_acquire(
        conn: &Connection,
        request: &LockRequest,
        now_ms: i64,
    ) -> Result<LockOutcome, LockError> {
        let ttl_ms = i64::try_from(request.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = now_ms.saturating_add(ttl_ms);
        let value = serde_json::to_string(&request.value)
            .map_err(|e| LockError::Backend(format!("Failed to encode lock value: {}", e)))?;

        let changed = conn
            .execute(
                "INSERT INTO locks (key, value, expires_at_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE
                 SET value = excluded.value, expires_at_ms = excluded.expires_at_ms
                 WHERE locks.expires_at_ms <= ?4",
                params![request.key, value, expires_at_ms, now_ms],
            )
            .map_err(map_sqlite_error)?;

        if changed == 1 {
            Ok(LockOutcome::Acquired)
        } else {
            Ok(LockOutcome::held())
        }
    }

    fn read_holder(conn: &Connection, key: &str, now_ms: i64) -> Result<Option<Value>, LockError> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM locks WHERE key = ?1 AND expires_at_ms > ?2",
                params![key, now_ms],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sqlite_error)?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| LockError::Backend(format!("Corrupt lock value for {}: {}", key, e)))
        })
        .transpose()
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, LockError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, LockError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| LockError::Backend("Lock store connection poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| LockError::Backend(format!("Lock store task failed: {}", e)))?
    }
}

#[async_trait]
impl LockStore for SqliteLockStore {
    async fn acquire(&self, request: &LockRequest) -> Result<LockOutcome, LockError> {
        let request = request.clone();
        self.with_connection(move |conn| {
            Self::try_acquire(conn, &request, Utc::now().timestamp_millis())
        })
        .await
    }

    async fn holder(&self, key: &str) -> Result<Option<Value>, LockError> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            Self::read_holder(conn, &key, Utc::now().timestamp_millis())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

fn map_sqlite_error(e: rusqlite::Error) -> LockError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy)
        | Some(ErrorCode::DatabaseLocked)
        | Some(ErrorCode::CannotOpen) => LockError::Unavailable(e.to_string()),
        _ => LockError::Backend(e.to_string()),
    }
}
