//! Upstream Response Schema
//!
//! The chat completion payload is untrusted input. It is checked against the
//! shape below without ever failing the request: a mismatch is reported as a
//! [`SchemaMismatch`] value and the caller decides how to degrade.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One citation returned by the search-augmented model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Parsed for completeness; not rendered
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl SourceRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date: None,
            last_updated: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

/// The subset of the chat completion payload this server consumes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub search_results: Option<Vec<SourceRecord>>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// The payload decoded as JSON but does not have the expected shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub reason: String,
}

impl std::fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unexpected response shape: {}", self.reason)
    }
}

impl UpstreamResponse {
    /// Check a decoded JSON value against the expected shape
    pub fn validate(raw: &Value) -> Result<Self, SchemaMismatch> {
        // `null` would otherwise decode through the field defaults
        if !raw.is_object() {
            return Err(SchemaMismatch {
                reason: format!("expected an object, got {}", json_kind(raw)),
            });
        }

        Self::deserialize(raw).map_err(|e| SchemaMismatch {
            reason: e.to_string(),
        })
    }

    /// Content of the first choice, or `""` when absent
    pub fn first_content(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .unwrap_or("")
    }

    /// Search results in received order, or an empty slice
    pub fn sources(&self) -> &[SourceRecord] {
        self.search_results.as_deref().unwrap_or(&[])
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
