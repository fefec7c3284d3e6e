use std::fmt;

use serde::{Deserialize, Serialize};

/// Type a field value is validated and coerced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Email,
    Integer,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Email => "email",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A single declarative check on one record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl FieldRule {
    pub fn required(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            required: true,
        }
    }

    pub fn optional(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            required: false,
        }
    }
}

/// Rules applied to every ticket, in evaluation order.
pub fn base_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::required("email", FieldType::Email),
        FieldRule::required("name", FieldType::String),
        FieldRule::required("subject", FieldType::String),
        FieldRule::required("message", FieldType::String),
        FieldRule::optional("topicId", FieldType::Integer),
        FieldRule::optional("payloadCheck", FieldType::Boolean),
    ]
}

/// Append `extra` after `base`.
///
/// Duplicate field names are kept: both rules are evaluated in order.
pub fn merge_rules(base: &[FieldRule], extra: &[FieldRule]) -> Vec<FieldRule> {
    base.iter().chain(extra.iter()).cloned().collect()
}
