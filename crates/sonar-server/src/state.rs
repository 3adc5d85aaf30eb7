//! Application State

use std::sync::Arc;

use sonar_core::ToolRegistry;

use crate::protocol::ServerInfo;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Tool registry with all available tools
    pub tools: Arc<ToolRegistry>,

    /// Name and version reported during initialization
    pub server_info: ServerInfo,
}

impl AppState {
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
            server_info: ServerInfo::default(),
        }
    }
}
