//! Mock lock store for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::lock::{LockError, LockOutcome, LockRequest, LockStore, MemoryLockStore};

/// Mock implementation of the LockStore trait.
///
/// Acquire semantics come from an inner [`MemoryLockStore`], so concurrent
/// callers race exactly as they would against a real atomic store. On top
/// of that the mock records requests, injects errors and can pre-hold keys.
#[derive(Clone)]
pub struct MockLockStore {
    inner: Arc<MemoryLockStore>,
    requests: Arc<RwLock<Vec<LockRequest>>>,
    next_error: Arc<RwLock<Option<LockError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockLockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLockStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryLockStore::new()),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Mark `key` as held by someone else for an hour. Not recorded.
    pub async fn hold(&self, key: &str) {
        let request = LockRequest::new(key, Value::Null, Duration::from_secs(3600));
        let _ = self.inner.acquire(&request).await;
    }

    /// Fail the next acquire with `error`.
    pub async fn set_next_error(&self, error: LockError) {
        *self.next_error.write().await = Some(error);
    }

    /// Sleep this long inside every acquire.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn requests(&self) -> Vec<LockRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl LockStore for MockLockStore {
    async fn acquire(&self, request: &LockRequest) -> Result<LockOutcome, LockError> {
        self.requests.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        self.inner.acquire(request).await
    }

    async fn holder(&self, key: &str) -> Result<Option<Value>, LockError> {
        self.inner.holder(key).await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
