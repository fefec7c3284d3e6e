//! Mock ticket transport for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::dispatch::{DispatchRequest, TicketTransport, TransportError, TransportResponse};

/// Mock implementation of the TicketTransport trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable response (default: 201 with ticket id "100001")
/// - Record every request for assertions
/// - Simulate transport errors and slow endpoints
#[derive(Debug, Clone)]
pub struct MockTransport {
    requests: Arc<RwLock<Vec<DispatchRequest>>>,
    response: Arc<RwLock<TransportResponse>>,
    next_error: Arc<RwLock<Option<TransportError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            response: Arc::new(RwLock::new(TransportResponse::new(201, "100001"))),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Response returned by every subsequent send.
    pub async fn set_response(&self, response: TransportResponse) {
        *self.response.write().await = response;
    }

    /// Fail the next send with `error`.
    pub async fn set_next_error(&self, error: TransportError) {
        *self.next_error.write().await = Some(error);
    }

    /// Sleep this long inside every send.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl TicketTransport for MockTransport {
    async fn send(&self, request: &DispatchRequest) -> Result<TransportResponse, TransportError> {
        self.requests.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.response.read().await.clone())
    }
}
