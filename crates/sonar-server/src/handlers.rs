//! JSON-RPC Handlers

use serde_json::{Value, json};

use sonar_core::{SonarError, ToolCall};

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JSONRPC_VERSION,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ToolInfo,
};
use crate::state::AppState;

/// Handle one line of input. Returns `None` for notifications.
pub async fn handle_line(state: &AppState, line: &str) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unparseable message");
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::parse_error(format!("Parse error: {e}")),
            ));
        }
    };

    if !value.is_object() {
        return Some(JsonRpcResponse::failure(
            Value::Null,
            JsonRpcError::invalid_request("Expected a single JSON-RPC request object"),
        ));
    }

    let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::failure(
                recover_id(&value),
                JsonRpcError::invalid_request(format!("Invalid request: {e}")),
            ));
        }
    };

    handle_request(state, request).await
}

/// Dispatch a well-formed request
pub async fn handle_request(state: &AppState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    let Some(id) = request.id.clone() else {
        tracing::debug!(method = %request.method, "Notification received");
        return None;
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(JsonRpcResponse::failure(
            id,
            JsonRpcError::invalid_request(format!("Unsupported jsonrpc version '{}'", request.jsonrpc)),
        ));
    }

    tracing::debug!(method = %request.method, ?id, "Request received");

    let outcome = match request.method.as_str() {
        "initialize" => initialize(state, request.params),
        "ping" => Ok(json!({})),
        "tools/list" => list_tools(state),
        "tools/call" => call_tool(state, request.params).await,
        other => Err(JsonRpcError::method_not_found(other)),
    };

    Some(match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    })
}

fn initialize(state: &AppState, params: Option<Value>) -> Result<Value, JsonRpcError> {
    let params: InitializeParams = match params {
        Some(p) => serde_json::from_value(p)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {e}")))?,
        None => InitializeParams::default(),
    };

    let result = InitializeResult::negotiate(
        params.protocol_version.as_deref(),
        state.server_info.clone(),
    );
    tracing::info!(protocol_version = %result.protocol_version, "Client initialized");

    to_value(&result)
}

fn list_tools(state: &AppState) -> Result<Value, JsonRpcError> {
    let tools = state
        .tools
        .schemas()
        .into_iter()
        .map(|schema| ToolInfo {
            input_schema: schema.input_schema(),
            name: schema.name,
            description: schema.description,
        })
        .collect();

    to_value(&ListToolsResult { tools })
}

async fn call_tool(state: &AppState, params: Option<Value>) -> Result<Value, JsonRpcError> {
    let params: CallToolParams = params
        .ok_or_else(|| JsonRpcError::invalid_params("tools/call requires params"))
        .and_then(|p| {
            serde_json::from_value(p)
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")))
        })?;

    let call = ToolCall {
        name: params.name,
        arguments: params.arguments.unwrap_or_default().into_iter().collect(),
    };

    match state.tools.execute(&call).await {
        Ok(result) => {
            tracing::debug!(tool = %call.name, success = result.success, "Tool call finished");
            to_value(&CallToolResult::text(result.output, !result.success))
        }
        Err(e @ (SonarError::ToolNotFound(_) | SonarError::ToolValidation(_))) => {
            Err(JsonRpcError::invalid_params(e.to_string()))
        }
        Err(e) => {
            tracing::error!(tool = %call.name, error = %e, "Tool call failed");
            Err(JsonRpcError::internal(e.to_string()))
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal(e.to_string()))
}

/// Echo back a usable id from a malformed request, or `null`
fn recover_id(value: &Value) -> Value {
    match value.get("id") {
        Some(id @ (Value::Number(_) | Value::String(_))) => id.clone(),
        _ => Value::Null,
    }
}
