//! Rule evaluation and type coercion.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::{Number, Value};

use super::{FieldRule, FieldType, Record, ValidationError};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").unwrap());

const TRUTHY: &[&str] = &["true", "1", "yes", "on"];
const FALSY: &[&str] = &["false", "0", "no", "off"];

/// Validate `record` against `rules` and return a sanitized copy.
///
/// Rules are evaluated left to right and the first failure is returned.
/// Absent and `null` values are treated the same. The output contains only
/// fields named by some rule; when a field is named twice, the later rule's
/// coerced value is kept.
pub fn validate(record: &Record, rules: &[FieldRule]) -> Result<Record, ValidationError> {
    let mut sanitized = Record::new();

    for rule in rules {
        let value = match record.get(&rule.field) {
            None | Some(Value::Null) => {
                if rule.required {
                    return Err(ValidationError::Missing {
                        field: rule.field.clone(),
                    });
                }
                continue;
            }
            Some(value) => value,
        };

        let coerced = coerce(&rule.field, rule.field_type, value)?;
        sanitized.insert(rule.field.clone(), coerced);
    }

    Ok(sanitized)
}

fn coerce(field: &str, expected: FieldType, value: &Value) -> Result<Value, ValidationError> {
    let invalid_type = || ValidationError::InvalidType {
        field: field.to_string(),
        expected,
    };
    let invalid_value = |reason: &str| ValidationError::InvalidValue {
        field: field.to_string(),
        expected,
        reason: reason.to_string(),
    };

    match expected {
        FieldType::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(invalid_type()),
        },
        FieldType::Email => {
            let Value::String(s) = value else {
                return Err(invalid_type());
            };
            let trimmed = s.trim();
            if EMAIL_PATTERN.is_match(trimmed) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(invalid_value("not a valid email address"))
            }
        }
        FieldType::Integer => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Value::Number(i.into()));
                }
                if let Some(u) = n.as_u64() {
                    return Ok(Value::Number(Number::from(u)));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Value::Number((f as i64).into()))
                    }
                    _ => Err(invalid_value("not a whole number")),
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .map_err(|_| invalid_value("not a whole number")),
            _ => Err(invalid_type()),
        },
        FieldType::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) => {
                let token = s.trim().to_ascii_lowercase();
                if TRUTHY.contains(&token.as_str()) {
                    Ok(Value::Bool(true))
                } else if FALSY.contains(&token.as_str()) {
                    Ok(Value::Bool(false))
                } else {
                    Err(invalid_value("not a recognized boolean token"))
                }
            }
            Value::Number(n) => match n.as_i64() {
                Some(1) => Ok(Value::Bool(true)),
                Some(0) => Ok(Value::Bool(false)),
                _ => Err(invalid_value("only 0 and 1 are accepted as booleans")),
            },
            _ => Err(invalid_type()),
        },
    }
}
