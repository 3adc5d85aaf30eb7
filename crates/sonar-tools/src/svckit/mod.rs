//! Service Kit - Agent Tools
//!
//! Tools that implement `sonar_core::Tool` on top of a chat backend.

mod answer;
mod lookup;

pub use answer::AnswerTool;
pub use lookup::LookupTool;

use sonar_core::{ChatCompletion, ChatConfiguration, Message, ToolResult};

/// Forward `text` as one user message and wrap the outcome as a tool result.
///
/// Backend failures become failed results so the client still gets text back.
async fn ask(
    chat: &dyn ChatCompletion,
    tool: &str,
    config: &ChatConfiguration,
    text: &str,
) -> ToolResult {
    tracing::debug!(tool, model = %config.model, "Forwarding tool request");

    match chat.complete(&[Message::user(text)], config).await {
        Ok(answer) => ToolResult::success(tool, answer),
        Err(e) => {
            tracing::warn!(tool, error = %e, "Tool request failed");
            ToolResult::failure(tool, format!("Error: {e}"))
        }
    }
}
