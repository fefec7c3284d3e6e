//! Idempotency locks.
//!
//! A [`LockStore`] offers a single atomic "set if absent, with expiry"
//! operation. Holding a key means a submission with that key was already
//! accepted within the key's TTL. Locks are never released explicitly; they
//! lapse when the TTL runs out.

mod memory;
mod sqlite;

pub use memory::MemoryLockStore;
pub use sqlite::SqliteLockStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::{LockBackend, LockConfig};

/// Status reported when a key is already held (HTTP 423 Locked).
pub const HELD_STATUS: u16 = 423;

/// Errors from the lock store itself, as opposed to a held key.
#[derive(Debug, Clone, Error)]
pub enum LockError {
    /// The store cannot be reached or is busy.
    #[error("Lock store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected error.
    #[error("Lock store error: {0}")]
    Backend(String),
}

/// A single acquire attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LockRequest {
    /// Idempotency key.
    pub key: String,
    /// Opaque payload kept alongside the key.
    pub value: Value,
    /// How long the key stays held.
    pub ttl: Duration,
}

impl LockRequest {
    pub fn new(key: impl Into<String>, value: Value, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }
}

/// Result of an acquire attempt against a reachable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The key was free (or expired) and is now held by this caller.
    Acquired,
    /// A live lock already exists for the key.
    Held { status: u16 },
}

impl LockOutcome {
    pub fn held() -> Self {
        LockOutcome::Held {
            status: HELD_STATUS,
        }
    }

    pub fn is_acquired(&self) -> bool {
        matches!(self, LockOutcome::Acquired)
    }
}

/// External key/value store with atomic set-if-absent semantics.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Try once to take `request.key` for `request.ttl`.
    async fn acquire(&self, request: &LockRequest) -> Result<LockOutcome, LockError>;

    /// Value stored by the current live holder of `key`, if any.
    async fn holder(&self, key: &str) -> Result<Option<Value>, LockError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Build the lock store selected in configuration.
pub fn create_lock_store(config: &LockConfig) -> Result<Arc<dyn LockStore>, LockError> {
    match config.backend {
        LockBackend::Memory => Ok(Arc::new(MemoryLockStore::new())),
        LockBackend::Sqlite => Ok(Arc::new(SqliteLockStore::new(&config.sqlite_path)?)),
    }
}
