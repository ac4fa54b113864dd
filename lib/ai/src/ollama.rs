//! Ollama `/api/chat` client.

use crate::backend::{ChatBackend, ChatReply, ChatRequest};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Ollama connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when neither the request nor the session names one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl OllamaConfig {
    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Chat backend talking to an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    base_url: String,
    client: Client,
}

impl OllamaBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

fn transport_error(e: &reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::ProviderUnavailable {
            provider: "ollama".to_string(),
            reason: e.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            status: e.status().map(|s| s.as_u16()),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, LlmError> {
        let response = self
            .client
            .post(self.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Ollama API returned error");
            return Err(LlmError::RequestFailed {
                status: Some(status.as_u16()),
                reason: body,
            });
        }

        let reply: ChatReply =
            serde_json::from_str(&body).map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        debug!(model = %reply.model, done = reply.done, "chat reply received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatMessage, MessageRole};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> OllamaBackend {
        let config = OllamaConfig {
            base_url: format!("{}/", server.uri()),
            ..OllamaConfig::default()
        };
        OllamaBackend::new(&config).expect("client builds")
    }

    #[test]
    fn config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.default_model, "llama3.2:latest");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn posts_request_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(serde_json::json!({
                "model": "llama3.2:latest",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2:latest",
                "created_at": "2024-05-01T12:00:00Z",
                "message": {"role": "assistant", "content": "Hi there!"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new("llama3.2:latest", vec![ChatMessage::user("hello")]);
        let reply = backend_for(&server).chat(&request).await.expect("reply");

        assert_eq!(reply.message.role, MessageRole::Assistant);
        assert_eq!(reply.content(), "Hi there!");
    }

    #[tokio::test]
    async fn non_success_status_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let request = ChatRequest::new("missing", vec![ChatMessage::user("hello")]);
        let err = backend_for(&server).chat(&request).await.unwrap_err();

        assert_eq!(
            err,
            LlmError::RequestFailed {
                status: Some(404),
                reason: "model not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn reply_without_message_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2:latest",
                "done": true
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new("llama3.2:latest", vec![ChatMessage::user("hello")]);
        let err = backend_for(&server).chat(&request).await.unwrap_err();

        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({})),
            )
            .mount(&server)
            .await;

        let config = OllamaConfig {
            base_url: server.uri(),
            timeout_seconds: 1,
            ..OllamaConfig::default()
        };
        let backend = OllamaBackend::new(&config).expect("client builds");
        let request = ChatRequest::new("llama3.2:latest", vec![ChatMessage::user("hello")]);

        assert_eq!(backend.chat(&request).await.unwrap_err(), LlmError::Timeout);
    }
}
