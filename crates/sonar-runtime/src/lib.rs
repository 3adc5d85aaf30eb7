//! # sonar-runtime
//!
//! Chat completion backends for sonar-mcp.
//!
//! ## Backends
//!
//! - **Perplexity** (default): search-augmented chat completions over HTTPS
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sonar_runtime::{PerplexityClient, PerplexityConfig};
//!
//! let client = PerplexityClient::new(PerplexityConfig::from_env()?)?;
//! let answer = client.complete(&[Message::user("What is MCP?")], &config).await?;
//! ```

#[cfg(feature = "perplexity")]
pub mod perplexity;

#[cfg(feature = "perplexity")]
pub use perplexity::{PerplexityClient, PerplexityConfig};

// Re-export core types for convenience
pub use sonar_core::{
    ChatCompletion, ChatConfiguration, Message, Result, Role, SearchBreadth, SonarError,
};
