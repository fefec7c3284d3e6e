//! Request resolution, debug echo and outcome classification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{
    DispatchParams, DispatchRequest, DispatchResult, HeaderMap, TicketTransport,
    DEFAULT_TICKET_PATH, PAYLOAD_HASH_HEADER,
};
use crate::config::ClientConfig;
use crate::metrics::DISPATCH_DURATION;

/// Debug ticket ids are drawn from `0..DEBUG_TICKET_ID_RANGE`.
pub const DEBUG_TICKET_ID_RANGE: u32 = 100_000;

/// Sends normalized tickets to the remote endpoint.
///
/// Configuration is fixed at construction except for the debug flag, which
/// can be flipped at runtime and is read by every in-flight call.
pub struct Dispatcher {
    base_url: String,
    default_headers: HeaderMap,
    default_path: String,
    debug_mode: AtomicBool,
    transport: Arc<dyn TicketTransport>,
}

impl Dispatcher {
    pub fn new(
        base_url: impl Into<String>,
        default_headers: HeaderMap,
        transport: Arc<dyn TicketTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers,
            default_path: DEFAULT_TICKET_PATH.to_string(),
            debug_mode: AtomicBool::new(false),
            transport,
        }
    }

    pub fn from_config(config: &ClientConfig, transport: Arc<dyn TicketTransport>) -> Self {
        Self::new(config.base_url.clone(), config.headers(), transport)
            .with_debug_mode(config.debug_mode)
    }

    pub fn with_debug_mode(self, enabled: bool) -> Self {
        self.debug_mode.store(enabled, Ordering::Relaxed);
        self
    }

    /// Path used when a call does not name one.
    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = path.into();
        self
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.debug_mode.store(enabled, Ordering::Relaxed);
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fill unset parameters from the client defaults.
    pub fn build_request(&self, params: &DispatchParams) -> DispatchRequest {
        DispatchRequest {
            method: params.method.clone().unwrap_or(Method::POST),
            base_url: self.base_url.clone(),
            path: params
                .path
                .clone()
                .unwrap_or_else(|| self.default_path.clone()),
            headers: params
                .headers
                .clone()
                .unwrap_or_else(|| self.default_headers.clone()),
            body: params.body.clone(),
        }
    }

    /// Send (or simulate) exactly one request.
    pub async fn dispatch(&self, params: DispatchParams) -> DispatchResult {
        let request = self.build_request(&params);

        if self.debug_mode() || params.debug {
            let ticket_id = debug_ticket_id();
            debug!(ticket_id, url = %request.url(), "Debug mode: ticket not sent");
            return DispatchResult::DebugEcho {
                ticket_id,
                payload: request.echo(),
            };
        }

        let start = Instant::now();
        let result = match self.transport.send(&request).await {
            Ok(response) if response.is_success() => {
                let ticket_id = parse_ticket_id(&response.body);
                if ticket_id.is_empty() {
                    DispatchResult::Failure {
                        code: "empty_body".to_string(),
                        message: "Ticketing endpoint returned no ticket id".to_string(),
                        status: Some(response.status),
                    }
                } else {
                    DispatchResult::Success {
                        ticket_id,
                        payload_hash: response.headers.get(PAYLOAD_HASH_HEADER).cloned(),
                    }
                }
            }
            Ok(response) => DispatchResult::Failure {
                code: format!("http_{}", response.status),
                message: if response.body.trim().is_empty() {
                    format!("Request failed with status code {}", response.status)
                } else {
                    response.body.trim().to_string()
                },
                status: Some(response.status),
            },
            Err(e) => DispatchResult::Failure {
                code: e.code().to_string(),
                message: e.to_string(),
                status: None,
            },
        };
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            DispatchResult::Success { ticket_id, .. } => {
                DISPATCH_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);
                info!(ticket_id = %ticket_id, url = %request.url(), "Ticket created");
            }
            DispatchResult::Failure { code, message, .. } => {
                DISPATCH_DURATION
                    .with_label_values(&["failure"])
                    .observe(elapsed);
                error!(
                    base_url = %request.base_url,
                    path = %request.path,
                    body = %request.body,
                    code = %code,
                    message = %message,
                    "Ticket dispatch failed"
                );
            }
            DispatchResult::DebugEcho { .. } => {}
        }

        result
    }
}

fn debug_ticket_id() -> u32 {
    rand::rng().random_range(0..DEBUG_TICKET_ID_RANGE)
}

/// A JSON string or number body is unwrapped; anything else is taken as text.
fn parse_ticket_id(body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) => s,
        Ok(Value::Number(n)) => n.to_string(),
        _ => trimmed.to_string(),
    }
}
