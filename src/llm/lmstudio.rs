//! Local provider for LM Studio (or any OpenAI-compatible server).

use std::sync::RwLock;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::chat::{ChatClient, Sampling};
use super::{AnalysisProvider, into_response, run_analysis};
use crate::analysis::types::{AnalysisResponse, EmailData};

/// Default LM Studio server URL.
pub const LMSTUDIO_DEFAULT_URL: &str = "http://localhost:1234";

/// Default local model.
pub const LMSTUDIO_DEFAULT_MODEL: &str = "meta-llama-3-8b-instruct";

#[derive(Debug, Clone, PartialEq)]
pub struct LmStudioConfig {
    /// Server root, e.g. `http://localhost:1234` or a tunnel URL.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        let sampling = Sampling::default();
        Self {
            base_url: LMSTUDIO_DEFAULT_URL.to_string(),
            model: LMSTUDIO_DEFAULT_MODEL.to_string(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        }
    }
}

impl LmStudioConfig {
    pub fn is_valid(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.model.trim().is_empty()
    }

    fn sampling(&self) -> Sampling {
        Sampling {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Partial update applied at runtime; `None` fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LmStudioUpdate {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LmStudioUpdate {
    fn apply(self, config: &mut LmStudioConfig) {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
    }
}

struct LmStudioState {
    config: LmStudioConfig,
    client: ChatClient,
}

impl LmStudioState {
    fn build(config: LmStudioConfig, http: reqwest::Client) -> Self {
        let endpoint = format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/'));
        let client = ChatClient::new(http, "LM Studio", endpoint, config.model.clone());
        Self { config, client }
    }
}

pub struct LmStudioProvider {
    http: reqwest::Client,
    state: RwLock<LmStudioState>,
}

impl LmStudioProvider {
    pub fn new(config: LmStudioConfig, http: reqwest::Client) -> Self {
        let state = LmStudioState::build(config, http.clone());
        Self {
            http,
            state: RwLock::new(state),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> LmStudioConfig {
        match self.state.read() {
            Ok(state) => state.config.clone(),
            Err(poisoned) => poisoned.into_inner().config.clone(),
        }
    }

    /// Merge `update` into the configuration and rebuild the client.
    ///
    /// Returns whether the resulting configuration is usable.
    pub fn update_config(&self, update: LmStudioUpdate) -> bool {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut config = state.config.clone();
        update.apply(&mut config);
        let valid = config.is_valid();
        *state = LmStudioState::build(config, self.http.clone());
        drop(state);

        tracing::info!(valid = valid, "LM Studio configuration updated");
        valid
    }

    fn snapshot(&self) -> (ChatClient, Sampling, bool) {
        let read = |state: &LmStudioState| {
            (
                state.client.clone(),
                state.config.sampling(),
                state.config.is_valid(),
            )
        };
        match self.state.read() {
            Ok(state) => read(&state),
            Err(poisoned) => read(&poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl AnalysisProvider for LmStudioProvider {
    fn name(&self) -> String {
        format!("LM Studio ({})", self.config().model)
    }

    fn is_configured(&self) -> bool {
        self.config().is_valid()
    }

    async fn analyze(&self, email: &EmailData, trusted_contacts: &[String]) -> AnalysisResponse {
        let started = Instant::now();

        // Lock is released before the request goes out.
        let (client, sampling, valid) = self.snapshot();
        if !valid {
            return AnalysisResponse::failure("LM Studio provider not properly configured");
        }

        let outcome = run_analysis(&client, sampling, email, trusted_contacts).await;
        into_response("lmstudio", outcome, started)
    }

    fn as_lmstudio(&self) -> Option<&LmStudioProvider> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> LmStudioProvider {
        LmStudioProvider::new(
            LmStudioConfig {
                base_url: server.uri(),
                model: "local-model".into(),
                ..LmStudioConfig::default()
            },
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn posts_to_v1_endpoint_with_configured_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "local-model", "max_tokens": 1000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "```json\n{\"verdict\":\"RISKY\",\"isScam\":false}\n```"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .analyze(&EmailData::from_body("Please confirm your address"), &[])
            .await;

        assert!(response.success, "error: {:?}", response.error);
        let result = response.result.unwrap();
        assert_eq!(result.verdict, crate::analysis::VerdictLevel::Risky);
        assert_eq!(result.confidence, 75);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let prompt = body["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.contains("No trusted contacts available"));
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn http_error_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .analyze(&EmailData::from_body("hello"), &[])
            .await;
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("LM Studio API error: 503 Service Unavailable")
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_failure_not_panic() {
        let provider = LmStudioProvider::new(
            LmStudioConfig {
                base_url: "http://127.0.0.1:9".into(),
                ..LmStudioConfig::default()
            },
            reqwest::Client::new(),
        );
        let response = provider.analyze(&EmailData::from_body("hello"), &[]).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("request failed"));
    }

    #[tokio::test]
    async fn invalid_config_makes_no_request() {
        let provider = LmStudioProvider::new(
            LmStudioConfig {
                model: " ".into(),
                ..LmStudioConfig::default()
            },
            reqwest::Client::new(),
        );
        assert!(!provider.is_configured());
        let response = provider.analyze(&EmailData::from_body("hello"), &[]).await;
        assert_eq!(
            response.error.as_deref(),
            Some("LM Studio provider not properly configured")
        );
    }

    #[test]
    fn update_config_merges_fields() {
        let provider = LmStudioProvider::new(LmStudioConfig::default(), reqwest::Client::new());
        assert!(provider.update_config(LmStudioUpdate {
            model: Some("qwen2.5-7b".into()),
            temperature: Some(0.1),
            ..Default::default()
        }));

        let config = provider.config();
        assert_eq!(config.model, "qwen2.5-7b");
        assert_eq!(config.base_url, LMSTUDIO_DEFAULT_URL);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(provider.name(), "LM Studio (qwen2.5-7b)");

        assert!(!provider.update_config(LmStudioUpdate {
            base_url: Some(String::new()),
            ..Default::default()
        }));
        assert!(!provider.is_configured());
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let provider = LmStudioProvider::new(LmStudioConfig::default(), reqwest::Client::new());
        std::thread::scope(|scope| {
            for i in 0..8u32 {
                let provider = &provider;
                scope.spawn(move || {
                    let update = if i % 2 == 0 {
                        LmStudioUpdate {
                            model: Some(format!("model-{i}")),
                            ..Default::default()
                        }
                    } else {
                        LmStudioUpdate {
                            max_tokens: Some(2_000 + i),
                            ..Default::default()
                        }
                    };
                    provider.update_config(update);
                });
            }
        });

        let config = provider.config();
        assert!(config.model.starts_with("model-"), "model: {}", config.model);
        assert!(config.max_tokens > 2_000, "max_tokens: {}", config.max_tokens);
    }
}
