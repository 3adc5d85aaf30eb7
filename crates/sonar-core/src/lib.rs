//! # sonar-core
//!
//! Provider-agnostic building blocks for the sonar-mcp server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Tool (lookup / answer)                  │
//! │  ┌─────────────┐  ┌─────────────────────┐  ┌─────────────┐  │
//! │  │    Tool     │──│   ChatCompletion    │──│  Response   │  │
//! │  │  Registry   │  │     (Strategy)      │  │  Assembly   │  │
//! │  └─────────────┘  └─────────────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Response assembly is split into three pure pieces:
//! [`response`] validates the upstream payload, [`reasoning`] removes the
//! model's `<think>` transcript and [`citation`] renders the source list.

pub mod citation;
pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod response;
pub mod tool;

pub use citation::{render as render_citations, sources_block};
pub use error::{Result, SonarError};
pub use message::{Message, Role};
pub use provider::{ChatCompletion, ChatConfiguration, SearchBreadth};
pub use reasoning::strip_reasoning;
pub use response::{SchemaMismatch, SourceRecord, UpstreamResponse};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
