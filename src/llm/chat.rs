//! OpenAI-compatible chat-completion client shared by both provider variants.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sampling settings for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

/// One endpoint, one model. Holds no per-call state.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    provider: String,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl ChatClient {
    pub fn new(
        http: reqwest::Client,
        provider: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            provider: provider.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
        }
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|e| LlmError::RequestFailed {
                    provider: self.provider.clone(),
                    reason: format!("Invalid API key header: {e}"),
                })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// POST a system + user message pair and return the first choice's text.
    ///
    /// Exactly one request is made. Non-2xx statuses are returned as
    /// [`LlmError::Http`]; there is no retry.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        sampling: Sampling,
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        debug!(
            provider = %self.provider,
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = user.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.provider.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http {
                provider: self.provider.clone(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: self.provider.clone(),
                    reason: e.to_string(),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: self.provider.clone(),
            })
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn debug_redacts_api_key() {
        let client = ChatClient::new(reqwest::Client::new(), "OpenAI", "http://x", "gpt-4")
            .with_api_key(SecretString::from("sk-very-secret"));
        let printed = format!("{client:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("sk-very-secret"));
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "model": "m",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    {"message": {"content": "first"}},
                    {"message": {"content": "second"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(reqwest::Client::new(), "Test", server.uri(), "m");
        let text = client
            .complete("sys", "hi", Sampling::default())
            .await
            .unwrap();
        assert_eq!(text, "first");
    }

    #[tokio::test]
    async fn blank_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "  "}}]
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(reqwest::Client::new(), "Test", server.uri(), "m");
        let err = client
            .complete("sys", "hi", Sampling::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = ChatClient::new(reqwest::Client::new(), "Test", server.uri(), "m");
        let err = client
            .complete("sys", "hi", Sampling::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }
}
