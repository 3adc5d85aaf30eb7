//! Tool System
//!
//! Tools are registered at startup and invoked by the protocol layer.
//! Each tool describes its parameters once; the same description drives
//! argument validation and the JSON Schema advertised to clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SonarError};

/// Tool call request from the client
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// String argument by name, if present and a string
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// Result from tool execution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (answer text or error description)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: error.into(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    /// A required string parameter
    pub fn required_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Tool definition schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the client's model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// JSON Schema object describing the tool's arguments
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            match call.arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(SonarError::ToolValidation(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) if param.param_type == "string" && !value.is_string() && !value.is_null() => {
                    return Err(SonarError::ToolValidation(format!(
                        "Parameter '{}' must be a string",
                        param.name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name, Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| SonarError::ToolNotFound(call.name.clone()))?;

        // Validate first
        tool.validate(call)?;

        tool.execute(call).await
    }

    /// All tool schemas, ordered by name
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the text back".into(),
                parameters: vec![ParameterSchema::required_string("text", "Text to echo")],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("echo", call.str_arg("text").unwrap_or_default()))
        }
    }

    #[test]
    fn test_input_schema() {
        let schema = EchoTool.schema().input_schema();
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo"}
                },
                "required": ["text"]
            })
        );
    }

    #[test]
    fn test_validate() {
        assert!(EchoTool.validate(&ToolCall::new("echo").with_argument("text", "hi")).is_ok());

        let err = EchoTool.validate(&ToolCall::new("echo")).unwrap_err();
        assert!(matches!(err, SonarError::ToolValidation(ref m) if m.contains("text")));

        let err = EchoTool
            .validate(&ToolCall::new("echo").with_argument("text", Value::Null))
            .unwrap_err();
        assert!(matches!(err, SonarError::ToolValidation(_)));

        let err = EchoTool
            .validate(&ToolCall::new("echo").with_argument("text", 5))
            .unwrap_err();
        assert!(matches!(err, SonarError::ToolValidation(ref m) if m.contains("must be a string")));
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(registry.get("unknown").is_none());

        let result = registry
            .execute(&ToolCall::new("echo").with_argument("text", "hi"))
            .await
            .unwrap();
        assert_eq!(result, ToolResult::success("echo", "hi"));

        let err = registry.execute(&ToolCall::new("missing")).await.unwrap_err();
        assert!(matches!(err, SonarError::ToolNotFound(ref n) if n == "missing"));
    }

    #[test]
    fn test_tool_call_defaults_arguments() {
        let call: ToolCall = serde_json::from_value(json!({"name": "echo"})).unwrap();
        assert!(call.arguments.is_empty());
    }
}
