use serde_json::Value;
use thiserror::Error;

/// Application-level failure carried in the top-level `error` field of a
/// response body.
///
/// The field counts as set when it is truthy: `null`, `false`, `0` and the
/// empty string are treated as absent. `message` is only populated when the
/// field is a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("application error"))]
pub struct ApiError {
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn from_payload(payload: &Value) -> Option<Self> {
        let field = payload.get("error")?;
        if !is_truthy(field) {
            return None;
        }
        Some(Self {
            message: field.as_str().map(str::to_string),
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
