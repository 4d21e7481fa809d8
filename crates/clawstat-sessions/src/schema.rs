//! On-disk record shapes of a session log
//!
//! Only the fields the parser needs are modelled. Unknown record types decode
//! to [`LogRecord::Other`]; unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum LogRecord {
    Session {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        cwd: Option<String>,
    },
    ModelChange {
        #[serde(default)]
        provider: Option<String>,
        #[serde(default, rename = "modelId")]
        model_id: Option<String>,
    },
    Custom {
        #[serde(default, rename = "customType")]
        custom_type: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    Message {
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        message: Option<LogMessage>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<LogUsage>,
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogUsage {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub cache_read: u64,
    #[serde(default)]
    pub cache_write: u64,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub cost: Option<LogCost>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogCost {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub input: f64,
    #[serde(default)]
    pub output: f64,
    #[serde(default)]
    pub cache_read: f64,
    #[serde(default)]
    pub cache_write: f64,
}

/// Provider and model carried by a `model-snapshot` custom record
pub(crate) fn snapshot_model(data: &Value) -> (Option<&str>, Option<&str>) {
    (
        data.get("provider").and_then(Value::as_str),
        data.get("modelId").and_then(Value::as_str),
    )
}

/// Text of the first content block of a message
///
/// Content is either a plain string or a list whose first element is a string
/// or a `{"type": "text", "text": ...}` block.
pub(crate) fn first_text(content: &Value) -> &str {
    match content {
        Value::String(text) => text.as_str(),
        Value::Array(items) => match items.first() {
            Some(Value::String(text)) => text.as_str(),
            Some(block @ Value::Object(_)) => block.get("text").and_then(Value::as_str).unwrap_or(""),
            _ => "",
        },
        _ => "",
    }
}
