//! Orchestrator inputs and outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProfileConfig;
use crate::dispatch::{DispatchResult, EchoPayload, HeaderMap, DEFAULT_TICKET_PATH};
use crate::validation::{base_rules, merge_rules, FieldRule, Record, ValidationError};

/// Per-call options for `create_ticket`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTicketOptions {
    /// Extra rules evaluated after the base and profile rules.
    #[serde(default, alias = "fieldsToCheck")]
    pub fields_to_check: Vec<FieldRule>,
    /// Echo instead of sending, for this call only.
    #[serde(default)]
    pub debug: bool,
    /// Idempotency key. Absent or empty disables the lock step.
    #[serde(default)]
    pub key: Option<String>,
    /// Opaque value stored with the lock. Defaults to a random token.
    #[serde(default)]
    pub value: Option<Value>,
    /// Lock TTL in seconds. Absent or zero uses the configured default.
    #[serde(default)]
    pub expires: Option<u64>,
    /// Replace the configured API headers for this call.
    #[serde(default)]
    pub headers: Option<HeaderMap>,
    /// Abandon the call if it has not finished within this many milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl CreateTicketOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(mut self, fields: Vec<FieldRule>) -> Self {
        self.fields_to_check = fields;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_expires(mut self, secs: u64) -> Self {
        self.expires = Some(secs);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The idempotency key, if one was given and is non-empty.
    pub fn lock_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Step at which a call was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Lock,
    Dispatch,
}

/// The single terminal result of a `create_ticket` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TicketOutcome {
    /// The record failed validation; nothing else ran.
    Invalid { error: ValidationError },
    /// The idempotency key is already held; the ticket was not sent.
    Duplicate { key: String, status: u16 },
    /// The lock store could not answer; the ticket was not sent.
    LockUnavailable { key: String, message: String },
    /// Debug mode: the ticket was echoed, not sent.
    DebugEcho { ticket_id: u32, payload: EchoPayload },
    /// The remote endpoint created the ticket.
    Created {
        ticket_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload_hash: Option<String>,
    },
    /// The send failed at the transport or with a non-2xx status.
    Failed {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
    /// The caller's cancellation fired while a step was suspended.
    Cancelled { stage: PipelineStage },
}

impl TicketOutcome {
    /// Metric/log label.
    pub fn label(&self) -> &'static str {
        match self {
            TicketOutcome::Invalid { .. } => "invalid",
            TicketOutcome::Duplicate { .. } => "duplicate",
            TicketOutcome::LockUnavailable { .. } => "lock_unavailable",
            TicketOutcome::DebugEcho { .. } => "debug_echo",
            TicketOutcome::Created { .. } => "created",
            TicketOutcome::Failed { .. } => "failed",
            TicketOutcome::Cancelled { .. } => "cancelled",
        }
    }

    /// Whether a ticket was created or simulated.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TicketOutcome::Created { .. } | TicketOutcome::DebugEcho { .. }
        )
    }
}

impl From<DispatchResult> for TicketOutcome {
    fn from(result: DispatchResult) -> Self {
        match result {
            DispatchResult::Success {
                ticket_id,
                payload_hash,
            } => TicketOutcome::Created {
                ticket_id,
                payload_hash,
            },
            DispatchResult::DebugEcho { ticket_id, payload } => {
                TicketOutcome::DebugEcho { ticket_id, payload }
            }
            DispatchResult::Failure {
                code,
                message,
                status,
            } => TicketOutcome::Failed {
                code,
                message,
                status,
            },
        }
    }
}

/// Rule set and payload shaping for one ticketing flavor.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionProfile {
    pub name: String,
    pub path: String,
    pub extra_fields: Vec<FieldRule>,
    pub payload_defaults: Record,
}

impl Default for SubmissionProfile {
    fn default() -> Self {
        Self {
            name: "osticket".to_string(),
            path: DEFAULT_TICKET_PATH.to_string(),
            extra_fields: Vec::new(),
            payload_defaults: Record::new(),
        }
    }
}

impl From<&ProfileConfig> for SubmissionProfile {
    fn from(config: &ProfileConfig) -> Self {
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            extra_fields: config.extra_fields.clone(),
            payload_defaults: config.payload_defaults.clone(),
        }
    }
}

impl SubmissionProfile {
    /// Base rules, then profile rules, then per-call rules.
    pub fn rules(&self, call_rules: &[FieldRule]) -> Vec<FieldRule> {
        merge_rules(&merge_rules(&base_rules(), &self.extra_fields), call_rules)
    }

    /// Outbound body: the sanitized record plus any defaults it lacks.
    pub fn shape(&self, sanitized: Record) -> Value {
        let mut body = sanitized;
        for (field, value) in &self.payload_defaults {
            body.entry(field.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(body)
    }
}
