//! Alert record

use serde_json::Value;

/// One parsed line of the alert log.
///
/// Only `id` and `rule.level` are interpreted; the full record is kept for
/// consumers that need the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub level: i64,
    pub record: Value,
}

impl Alert {
    /// Extract id and level from a decoded record.
    ///
    /// A missing `id` or `rule.level` reads as 0. Numbers may arrive as
    /// integers, floats (truncated) or numeric strings.
    pub fn from_record(record: Value) -> Result<Self, FieldError> {
        let object = record.as_object().ok_or(FieldError::NotAnObject {
            found: kind(&record),
        })?;

        let id = match object.get("id") {
            None => 0,
            Some(raw) => coerce_int(raw).ok_or_else(|| FieldError::NonNumericId(raw.to_string()))?,
        };

        let level = match object.get("rule") {
            None => 0,
            Some(Value::Object(rule)) => match rule.get("level") {
                None => 0,
                Some(raw) => coerce_int(raw)
                    .ok_or_else(|| FieldError::NonNumericLevel(raw.to_string()))?,
            },
            Some(other) => return Err(FieldError::RuleNotAnObject { found: kind(other) }),
        };

        Ok(Self { id, level, record })
    }

    /// Parse a single JSON line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let record: Value = serde_json::from_str(line)?;
        Ok(Self::from_record(record)?)
    }
}

/// Line-level parse failure, turned into a located `SourceError` by the reader
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Record decoded but `id` or `rule.level` unusable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("expected a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("non-numeric id {0}")]
    NonNumericId(String),

    #[error("expected rule object, got {found}")]
    RuleNotAnObject { found: &'static str },

    #[error("non-numeric rule.level {0}")]
    NonNumericLevel(String),
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
