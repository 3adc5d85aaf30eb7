//! Perplexity Chat Completion Backend
//!
//! Implementation of `ChatCompletion` for the Perplexity chat completions
//! API. One call is one HTTPS request; nothing is retried or cached.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use sonar_core::{
    citation::sources_block,
    error::{Result, SonarError, UNREADABLE_BODY},
    message::{Message, with_system_prompt},
    provider::{ChatCompletion, ChatConfiguration, SearchBreadth},
    reasoning::strip_reasoning,
    response::UpstreamResponse,
};

/// Default API origin
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";

/// Environment variable overriding the API origin
pub const BASE_URL_VAR: &str = "PERPLEXITY_BASE_URL";

/// Environment variable setting a request timeout in seconds
pub const TIMEOUT_VAR: &str = "PERPLEXITY_TIMEOUT_SECS";

/// Perplexity client configuration
#[derive(Clone)]
pub struct PerplexityConfig {
    /// Bearer token sent with every request
    pub api_key: String,

    /// API origin, without the `/chat/completions` path
    pub base_url: String,

    /// Whole-request timeout; `None` keeps the transport default
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for PerplexityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PerplexityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SonarError::Config(format!("{API_KEY_VAR} is not set")))?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config.base_url = base_url;
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SonarError::Config(format!("{TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"))
            })?;
            if secs == 0 {
                return Err(SonarError::Config(format!("{TIMEOUT_VAR} must be at least 1 second")));
            }
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[derive(Serialize)]
struct WebSearchOptions {
    search_context_size: SearchBreadth,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    web_search_options: WebSearchOptions,
}

/// Perplexity chat completion client
pub struct PerplexityClient {
    client: Client,
    config: PerplexityConfig,
}

impl PerplexityClient {
    pub fn new(config: PerplexityConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| SonarError::Config(format!("failed to build HTTP client: {}", error_chain(&e))))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn post(&self, request: &ChatRequest<'_>) -> Result<Value> {
        let url = self.endpoint();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%url, error = %error_chain(&e), "Chat completion request failed");
                SonarError::Transport(error_chain(&e))
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Chat completion response received");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
            tracing::error!(status = status.as_u16(), %body, "Chat completion API returned an error status");

            return Err(SonarError::UpstreamStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SonarError::Transport(error_chain(&e)))?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Chat completion response is not valid JSON");
            SonarError::UpstreamParse(e.to_string())
        })
    }
}

#[async_trait]
impl ChatCompletion for PerplexityClient {
    async fn complete(&self, messages: &[Message], config: &ChatConfiguration) -> Result<String> {
        if self.config.api_key.trim().is_empty() {
            return Err(SonarError::Config(format!("{API_KEY_VAR} is empty")));
        }

        let request = ChatRequest {
            model: &config.model,
            messages: with_system_prompt(&config.system_prompt, messages),
            web_search_options: WebSearchOptions {
                search_context_size: config.search_breadth,
            },
        };

        tracing::debug!(
            model = %config.model,
            search_breadth = %config.search_breadth,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let raw = self.post(&request).await?;
        Ok(assemble_answer(&raw))
    }
}

/// Turn a decoded response body into the final answer text.
///
/// Shape mismatches degrade to an empty answer. The result is trimmed and
/// ends with exactly one newline.
pub fn assemble_answer(raw: &Value) -> String {
    let response = UpstreamResponse::validate(raw).unwrap_or_else(|mismatch| {
        tracing::warn!(%mismatch, "Treating chat completion response as empty");
        UpstreamResponse::default()
    });

    if let Some(usage) = response.usage {
        tracing::debug!(
            prompt_tokens = ?usage.prompt_tokens,
            completion_tokens = ?usage.completion_tokens,
            total_tokens = ?usage.total_tokens,
            "Token usage"
        );
    }

    let mut text = strip_reasoning(response.first_content());

    let sources = sources_block(response.sources());
    if !sources.is_empty() {
        text.push_str("\n\n");
        text.push_str(&sources);
    }

    let mut answer = text.trim().to_string();
    answer.push('\n');
    answer
}

/// Display an error together with its source chain
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_config() -> ChatConfiguration {
        ChatConfiguration::new("sonar-pro", "Answer briefly.", SearchBreadth::Low)
    }

    async fn setup_mock_server(template: ResponseTemplate) -> (MockServer, PerplexityClient) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(template)
            .mount(&mock_server)
            .await;

        let config = PerplexityConfig::new("test-key").with_base_url(mock_server.uri());
        let client = PerplexityClient::new(config).unwrap();
        (mock_server, client)
    }

    #[test]
    fn test_assemble_end_to_end_shape() {
        let raw = json!({
            "choices": [{"message": {"content": "<think>x</think>Answer"}}],
            "search_results": [{"title": "A", "url": "http://a"}]
        });
        assert_eq!(assemble_answer(&raw), "Answer\n\nSources:\n[1] A — http://a\n");
    }

    #[test]
    fn test_assemble_missing_choices() {
        assert_eq!(assemble_answer(&json!({})), "\n");
        assert_eq!(
            assemble_answer(&json!({"search_results": [{"title": "A", "url": "http://a", "date": "2024"}]})),
            "Sources:\n[1] A — http://a (2024)\n"
        );
    }

    #[test]
    fn test_assemble_schema_mismatch_is_empty() {
        let raw = json!({
            "choices": [{"message": {"content": "fine"}}],
            "search_results": [{"title": "missing url"}]
        });
        assert_eq!(assemble_answer(&raw), "\n");
        assert_eq!(assemble_answer(&json!([1, 2, 3])), "\n");
    }

    #[test]
    fn test_assemble_trims_and_keeps_inner_whitespace() {
        let raw = json!({"choices": [{"message": {"content": "\n\n<think>plan</think>\n  Line one\n\nLine two  \n\n"}}]});
        assert_eq!(assemble_answer(&raw), "Line one\n\nLine two\n");
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (API_KEY_VAR, "secret"),
            (BASE_URL_VAR, "http://localhost:9999"),
            (TIMEOUT_VAR, "30"),
        ]);
        let config = PerplexityConfig::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_config_defaults_and_missing_key() {
        let config = PerplexityConfig::from_lookup(|k| (k == API_KEY_VAR).then(|| "k".to_string())).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, None);

        let err = PerplexityConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, SonarError::Config(ref m) if m.contains(API_KEY_VAR)));

        let err = PerplexityConfig::from_lookup(|k| (k == API_KEY_VAR).then(|| "  ".to_string())).unwrap_err();
        assert!(matches!(err, SonarError::Config(_)));
    }

    #[test]
    fn test_config_bad_timeout() {
        let err = PerplexityConfig::from_lookup(|k| match k {
            API_KEY_VAR => Some("k".into()),
            TIMEOUT_VAR => Some("soon".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, SonarError::Config(ref m) if m.contains("soon")));

        let err = PerplexityConfig::from_lookup(|k| match k {
            API_KEY_VAR => Some("k".into()),
            TIMEOUT_VAR => Some("0".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, SonarError::Config(ref m) if m.contains(TIMEOUT_VAR)));
    }

    #[tokio::test]
    async fn test_complete_end_to_end() {
        let body = json!({
            "id": "resp-1",
            "model": "sonar-pro",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "<think>x</think>Answer"},
                "finish_reason": "stop"
            }],
            "search_results": [{"title": "A", "url": "http://a"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        });
        let (_server, client) = setup_mock_server(ResponseTemplate::new(200).set_body_json(body)).await;

        let answer = client
            .complete(&[Message::user("question?")], &lookup_config())
            .await
            .unwrap();
        assert_eq!(answer, "Answer\n\nSources:\n[1] A — http://a\n");
    }

    #[tokio::test]
    async fn test_request_shape() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(json!({
                "model": "sonar-pro",
                "messages": [
                    {"role": "system", "content": "Answer briefly."},
                    {"role": "user", "content": "first"},
                    {"role": "user", "content": "second"}
                ],
                "web_search_options": {"search_context_size": "low"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        // Trailing slash on the origin must not double up in the path
        let config = PerplexityConfig::new("test-key").with_base_url(format!("{}/", mock_server.uri()));
        let client = PerplexityClient::new(config).unwrap();

        let answer = client
            .complete(&[Message::user("first"), Message::user("second")], &lookup_config())
            .await
            .unwrap();
        assert_eq!(answer, "ok\n");
    }

    #[tokio::test]
    async fn test_complete_status_error() {
        let (_server, client) =
            setup_mock_server(ResponseTemplate::new(401).set_body_string("invalid api key")).await;

        let err = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap_err();

        match err {
            SonarError::UpstreamStatus { status, status_text, body } => {
                assert_eq!(status, 401);
                assert_eq!(status_text, "Unauthorized");
                assert_eq!(body, "invalid api key");
            }
            other => panic!("Expected UpstreamStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_error_with_truncated_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Consume the whole request so closing the socket is a clean FIN
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);

                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            // Promise 100 bytes, send 5, then hang up
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.flush().await.unwrap();
        });

        let config = PerplexityConfig::new("test-key").with_base_url(format!("http://{addr}"));
        let client = PerplexityClient::new(config).unwrap();

        let err = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap_err();

        match err {
            SonarError::UpstreamStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, UNREADABLE_BODY);
            }
            other => panic!("Expected UpstreamStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_parse_error() {
        let (_server, client) =
            setup_mock_server(ResponseTemplate::new(200).set_body_string("<html>not json</html>")).await;

        let err = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SonarError::UpstreamParse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_complete_missing_choices() {
        let (_server, client) = setup_mock_server(ResponseTemplate::new(200).set_body_json(json!({}))).await;

        let answer = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap();
        assert_eq!(answer, "\n");
    }

    #[tokio::test]
    async fn test_complete_transport_error() {
        let config = PerplexityConfig::new("test-key").with_base_url("http://127.0.0.1:1");
        let client = PerplexityClient::new(config).unwrap();

        let err = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SonarError::Transport(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Network error"));
    }

    #[tokio::test]
    async fn test_complete_timeout_is_transport_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let config = PerplexityConfig::new("test-key")
            .with_base_url(mock_server.uri())
            .with_timeout(Duration::from_millis(100));
        let client = PerplexityClient::new(config).unwrap();

        let err = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SonarError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_empty_key_fails_before_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let config = PerplexityConfig::new("   ").with_base_url(mock_server.uri());
        let client = PerplexityClient::new(config).unwrap();

        let err = client
            .complete(&[Message::user("q")], &lookup_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SonarError::Config(_)), "got {err:?}");
    }
}
