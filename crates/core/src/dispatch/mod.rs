//! Outbound ticket submission.
//!
//! The [`Dispatcher`] resolves a submission into a concrete [`DispatchRequest`]
//! against the configured ticketing endpoint and either sends it through a
//! [`TicketTransport`] or, in debug mode, echoes it back without any I/O.

mod dispatcher;
mod http;
mod types;

pub use dispatcher::Dispatcher;
pub use http::HttpTransport;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the optional API secret.
pub const API_SECRET_HEADER: &str = "x-api-auth";

/// Response header with the remote side's payload hash (verification mode).
pub const PAYLOAD_HASH_HEADER: &str = "x-ac-payloadhash";

/// Default ticket creation path.
pub const DEFAULT_TICKET_PATH: &str = "/api/tickets.json";

/// Default ticketing host.
pub const DEFAULT_BASE_URL: &str = "https://osticket.com/";

/// Errors raised below HTTP status handling.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Coarse failure code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Request(_) => "request",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Sends one request and returns the raw response.
///
/// Non-2xx statuses are returned as `Ok`; classifying them is the
/// dispatcher's job.
#[async_trait]
pub trait TicketTransport: Send + Sync {
    async fn send(&self, request: &DispatchRequest) -> Result<TransportResponse, TransportError>;
}
