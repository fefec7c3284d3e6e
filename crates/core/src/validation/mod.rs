//! Field validation and sanitization for ticket records.
//!
//! A record is checked against an ordered list of [`FieldRule`]s. The first
//! failing rule ends evaluation, and on success only fields named by a rule
//! survive into the sanitized copy.

mod rules;
mod sanitizer;

pub use rules::{base_rules, merge_rules, FieldRule, FieldType};
pub use sanitizer::validate;

use serde::Serialize;
use thiserror::Error;

/// A caller-supplied record: field name to untyped JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Why a record was rejected. Only the first violation is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is absent or null.
    #[error("Missing required field: {field}")]
    #[serde(rename = "missing_field")]
    Missing { field: String },

    /// The value has a JSON type that cannot be coerced to the rule's type.
    #[error("Field {field} must be of type {expected}")]
    InvalidType { field: String, expected: FieldType },

    /// The value has a usable JSON type but its content is not acceptable.
    #[error("Field {field} is not a valid {expected}: {reason}")]
    InvalidValue {
        field: String,
        expected: FieldType,
        reason: String,
    },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::InvalidType { field, .. }
            | ValidationError::InvalidValue { field, .. } => field,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Missing { .. } => "missing_field",
            ValidationError::InvalidType { .. } => "invalid_type",
            ValidationError::InvalidValue { .. } => "invalid_value",
        }
    }
}
