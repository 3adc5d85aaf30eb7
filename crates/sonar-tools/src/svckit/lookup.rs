//! Lookup Tool
//!
//! Quick, low-breadth web search for short factual answers.

use std::sync::Arc;

use async_trait::async_trait;

use sonar_core::{
    ChatCompletion, ChatConfiguration, ParameterSchema, Result as CoreResult, SearchBreadth,
    SonarError, Tool, ToolCall, ToolResult, ToolSchema,
};

use crate::{DEFAULT_LOOKUP_MODEL, LOOKUP_PROMPT};

/// Tool for short, search-backed lookups
pub struct LookupTool {
    chat: Arc<dyn ChatCompletion>,
    config: ChatConfiguration,
}

impl LookupTool {
    pub const NAME: &'static str = "lookup";

    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self {
            chat,
            config: ChatConfiguration::new(DEFAULT_LOOKUP_MODEL, LOOKUP_PROMPT, SearchBreadth::Low),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }
}

#[async_trait]
impl Tool for LookupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Search the web for a quick, concise answer to a factual query. \
                Returns a short answer followed by numbered sources."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "query",
                "What to look up (e.g., 'latest stable Rust version')",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call
            .str_arg("query")
            .ok_or_else(|| SonarError::ToolValidation("Missing query".into()))?;

        Ok(super::ask(self.chat.as_ref(), Self::NAME, &self.config, query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChat;
    use sonar_core::Message;

    #[tokio::test]
    async fn test_lookup_forwards_query() {
        let chat = Arc::new(MockChat::new("Rust 1.85\n"));
        let tool = LookupTool::new(chat.clone());

        let result = tool
            .execute(&ToolCall::new("lookup").with_argument("query", "latest rust"))
            .await
            .unwrap();
        assert_eq!(result, ToolResult::success("lookup", "Rust 1.85\n"));

        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages, vec![Message::user("latest rust")]);
        assert_eq!(requests[0].config.model, DEFAULT_LOOKUP_MODEL);
        assert_eq!(requests[0].config.system_prompt, LOOKUP_PROMPT);
        assert_eq!(requests[0].config.search_breadth, SearchBreadth::Low);
    }

    #[tokio::test]
    async fn test_lookup_model_override() {
        let chat = Arc::new(MockChat::new("ok\n"));
        let tool = LookupTool::new(chat.clone()).with_model("sonar");

        tool.execute(&ToolCall::new("lookup").with_argument("query", "q"))
            .await
            .unwrap();
        assert_eq!(chat.requests()[0].config.model, "sonar");
    }

    #[tokio::test]
    async fn test_lookup_backend_failure_is_failed_result() {
        let tool = LookupTool::new(Arc::new(MockChat::failing(502, "bad gateway")));

        let result = tool
            .execute(&ToolCall::new("lookup").with_argument("query", "q"))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("502"));
        assert!(result.output.contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_lookup_missing_query() {
        let tool = LookupTool::new(Arc::new(MockChat::new("unused")));
        assert!(tool.validate(&ToolCall::new("lookup")).is_err());
        assert!(tool.execute(&ToolCall::new("lookup")).await.is_err());
    }
}
