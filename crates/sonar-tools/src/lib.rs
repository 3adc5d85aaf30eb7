//! # sonar-tools
//!
//! The two tools sonar-mcp exposes. Both forward a single natural-language
//! request to a [`ChatCompletion`] backend and return its text unchanged.
//!
//! | tool     | argument   | model (default)       | search breadth |
//! |----------|------------|-----------------------|----------------|
//! | `lookup` | `query`    | `sonar-pro`           | low            |
//! | `answer` | `question` | `sonar-reasoning-pro` | high           |

pub mod mock;
pub mod svckit;

use std::sync::Arc;

use sonar_core::{ChatCompletion, ToolRegistry};

pub use svckit::{AnswerTool, LookupTool};

/// Default model for `lookup`
pub const DEFAULT_LOOKUP_MODEL: &str = "sonar-pro";

/// Default model for `answer`
pub const DEFAULT_ANSWER_MODEL: &str = "sonar-reasoning-pro";

/// System prompt for quick factual lookups
pub const LOOKUP_PROMPT: &str = r"You are a fast, precise web search assistant.

Answer the query directly and concisely using current information from the web.
- Lead with the answer itself, not with a restatement of the query.
- Prefer concrete facts, numbers, names and dates.
- Keep it short: a few sentences or a compact list.
- If sources disagree or information is uncertain, say so briefly.";

/// System prompt for questions that need research and reasoning
pub const ANSWER_PROMPT: &str = r"You are a careful research assistant.

Answer the question thoroughly, reasoning from current information found on the web.
- Break complex questions into parts and address each one.
- Compare perspectives when sources differ, and explain trade-offs.
- Distinguish established facts from estimates or opinions.
- Finish with a clear, direct conclusion.";

/// Model selection for the registered tools
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolModels {
    pub lookup: String,
    pub answer: String,
}

impl Default for ToolModels {
    fn default() -> Self {
        Self {
            lookup: DEFAULT_LOOKUP_MODEL.into(),
            answer: DEFAULT_ANSWER_MODEL.into(),
        }
    }
}

/// Registry holding `lookup` and `answer`, both backed by `chat`
pub fn registry(chat: Arc<dyn ChatCompletion>, models: &ToolModels) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(LookupTool::new(chat.clone()).with_model(models.lookup.clone()));
    tools.register(AnswerTool::new(chat).with_model(models.answer.clone()));
    tools
}
