//! Chat Completion Strategy
//!
//! Defines the interface tools use to reach a search-augmented chat model,
//! so the tool layer never depends on a concrete HTTP client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sonar_core::provider::{ChatCompletion, ChatConfiguration, SearchBreadth};
//!
//! let config = ChatConfiguration::new("sonar-pro", "Be concise.", SearchBreadth::Low);
//! let answer = client.complete(&[Message::user("What is MCP?")], &config).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// How much web context the upstream service should gather before answering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBreadth {
    Low,
    #[default]
    Medium,
    High,
}

impl SearchBreadth {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for SearchBreadth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call configuration chosen by a tool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfiguration {
    /// Model identifier (e.g., "sonar-pro")
    pub model: String,

    /// Instructions sent as the leading system message
    pub system_prompt: String,

    /// Search context size requested from the service
    #[serde(default)]
    pub search_breadth: SearchBreadth,
}

impl ChatConfiguration {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        search_breadth: SearchBreadth,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            search_breadth,
        }
    }
}

/// Strategy trait for chat completion backends
///
/// Implementations return the final, user-facing answer text: reasoning
/// removed, citations appended, ending in exactly one newline.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `messages` (after a system message built from `config`) and return the answer
    async fn complete(&self, messages: &[Message], config: &ChatConfiguration) -> Result<String>;
}
