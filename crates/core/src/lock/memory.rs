//! In-process lock store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{LockError, LockOutcome, LockRequest, LockStore};

/// Expiry used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct LockEntry {
    value: Value,
    expires_at: Instant,
}

/// Lock store backed by a mutex-guarded map.
///
/// Only deduplicates callers within the same process. Expired entries are
/// swept on every acquire, so the map never holds more than the live locks
/// plus the one being inserted.
#[derive(Default)]
pub struct MemoryLockStore {
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) locks.
    pub async fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// Drop expired entries.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now)
    }
}

fn sweep(entries: &mut HashMap<String, LockEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, e| e.expires_at > now);
    before - entries.len()
}

fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn acquire(&self, request: &LockRequest) -> Result<LockOutcome, LockError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now);

        if entries.contains_key(&request.key) {
            return Ok(LockOutcome::held());
        }

        entries.insert(
            request.key.clone(),
            LockEntry {
                value: request.value.clone(),
                expires_at: expiry(now, request.ttl),
            },
        );
        Ok(LockOutcome::Acquired)
    }

    async fn holder(&self, key: &str) -> Result<Option<Value>, LockError> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
