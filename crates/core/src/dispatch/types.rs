use std::collections::BTreeMap;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// Header name to value. Names are lowercase.
pub type HeaderMap = BTreeMap<String, String>;

/// Per-call inputs to the dispatcher. Unset fields fall back to the
/// client's configured defaults.
#[derive(Debug, Clone, Default)]
pub struct DispatchParams {
    pub method: Option<Method>,
    pub path: Option<String>,
    pub headers: Option<HeaderMap>,
    pub body: Value,
    /// Simulate the send instead of performing it.
    pub debug: bool,
}

impl DispatchParams {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub method: Method,
    pub base_url: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

impl DispatchRequest {
    /// Join base URL and path with exactly one slash between them.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    /// What a debug echo reports: everything except headers.
    pub fn echo(&self) -> EchoPayload {
        EchoPayload {
            method: self.method.as_str().to_string(),
            base_url: self.base_url.clone(),
            path: self.path.clone(),
            body: self.body.clone(),
        }
    }
}

/// Raw response handed back by a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Lowercase header names.
    pub headers: HeaderMap,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request a debug dispatch would have sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoPayload {
    pub method: String,
    pub base_url: String,
    pub path: String,
    pub body: Value,
}

/// Outcome of a single dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DispatchResult {
    /// The remote endpoint accepted the ticket.
    Success {
        ticket_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload_hash: Option<String>,
    },
    /// Debug mode: nothing was sent.
    DebugEcho { ticket_id: u32, payload: EchoPayload },
    /// Transport error or non-2xx response.
    Failure {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}
