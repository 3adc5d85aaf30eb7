//! sonar-mcp stdio server
//!
//! Speaks MCP over stdin/stdout and exposes the `lookup` and `answer`
//! tools, both backed by the Perplexity chat completions API.
//!
//! stdout carries protocol messages only; all logging goes to stderr.

mod handlers;
mod protocol;
mod state;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sonar_core::SonarError;
use sonar_runtime::perplexity::{
    API_KEY_VAR, BASE_URL_VAR, DEFAULT_BASE_URL, PerplexityClient, PerplexityConfig, TIMEOUT_VAR,
};
use sonar_tools::{DEFAULT_ANSWER_MODEL, DEFAULT_LOOKUP_MODEL, ToolModels};

use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "sonar-mcp", version, about = "MCP server for search-backed lookup and answer tools")]
struct Cli {
    /// Perplexity API key
    #[arg(long, env = API_KEY_VAR, hide_env_values = true)]
    api_key: Option<String>,

    /// API origin
    #[arg(long, env = BASE_URL_VAR, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds (transport default when unset)
    #[arg(long, env = TIMEOUT_VAR)]
    timeout_secs: Option<u64>,

    /// Model used by the `lookup` tool
    #[arg(long, env = "SONAR_LOOKUP_MODEL", default_value = DEFAULT_LOOKUP_MODEL)]
    lookup_model: String,

    /// Model used by the `answer` tool
    #[arg(long, env = "SONAR_ANSWER_MODEL", default_value = DEFAULT_ANSWER_MODEL)]
    answer_model: String,
}

impl Cli {
    fn perplexity_config(&self) -> Result<PerplexityConfig, SonarError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                SonarError::Config(format!("API key missing: set {API_KEY_VAR} or pass --api-key"))
            })?;

        let mut config = PerplexityConfig::new(api_key).with_base_url(self.base_url.clone());
        match self.timeout_secs {
            Some(0) => {
                return Err(SonarError::Config("--timeout-secs must be at least 1".into()));
            }
            Some(secs) => config = config.with_timeout(Duration::from_secs(secs)),
            None => {}
        }
        Ok(config)
    }

    fn models(&self) -> ToolModels {
        ToolModels {
            lookup: self.lookup_model.clone(),
            answer: self.answer_model.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before parsing so .env values act as defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    let config = cli.perplexity_config()?;
    tracing::info!(base_url = %config.base_url, timeout = ?config.timeout, "Configured Perplexity client");

    let client = Arc::new(PerplexityClient::new(config)?);
    let tools = sonar_tools::registry(client, &cli.models());

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let state = AppState::new(tools);

    tracing::info!(
        "sonar-mcp {} listening on stdio",
        env!("CARGO_PKG_VERSION")
    );

    transport::serve(state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
