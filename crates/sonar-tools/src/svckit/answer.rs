//! Answer Tool
//!
//! Broad web research with a reasoning model, for questions that need more
//! than a one-line fact. The model's reasoning transcript is removed by the
//! backend before the answer reaches this tool.

use std::sync::Arc;

use async_trait::async_trait;

use sonar_core::{
    ChatCompletion, ChatConfiguration, ParameterSchema, Result as CoreResult, SearchBreadth,
    SonarError, Tool, ToolCall, ToolResult, ToolSchema,
};

use crate::{ANSWER_PROMPT, DEFAULT_ANSWER_MODEL};

/// Tool for researched, reasoned answers
pub struct AnswerTool {
    chat: Arc<dyn ChatCompletion>,
    config: ChatConfiguration,
}

impl AnswerTool {
    pub const NAME: &'static str = "answer";

    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self {
            chat,
            config: ChatConfiguration::new(DEFAULT_ANSWER_MODEL, ANSWER_PROMPT, SearchBreadth::High),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }
}

#[async_trait]
impl Tool for AnswerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Research a question on the web and reason through a thorough answer. \
                Use for comparisons, explanations and multi-part questions. \
                Returns the answer followed by numbered sources."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "question",
                "The question to research and answer",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let question = call
            .str_arg("question")
            .ok_or_else(|| SonarError::ToolValidation("Missing question".into()))?;

        Ok(super::ask(self.chat.as_ref(), Self::NAME, &self.config, question).await)
    }
}
