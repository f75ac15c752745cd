use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix under which chat messages are stored.
pub const MESSAGES_PREFIX: &str = "my.messages";

/// A chat message as stored under `my.messages.<epoch-ms>`.
///
/// Unknown fields are kept so that edits never drop data written by other
/// clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            username: username.into(),
            extra: Map::new(),
        }
    }

    pub fn decode(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Same message with new text; the author is preserved.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }
}

/// Store key for a message created at `millis`.
pub fn message_key(millis: u64) -> String {
    format!("{MESSAGES_PREFIX}.{millis}")
}

/// Key suffix rendered in local time, or as-is when it is not a timestamp.
pub fn format_timestamp(time: &str) -> String {
    time.parse::<i64>()
        .ok()
        .and_then(|millis| Local.timestamp_millis_opt(millis).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| time.to_string())
}
