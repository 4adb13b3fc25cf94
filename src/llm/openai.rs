//! Cloud provider backed by the OpenAI chat-completions API.

use std::time::Instant;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::chat::{ChatClient, Sampling};
use super::{AnalysisProvider, into_response, run_analysis};
use crate::analysis::types::{AnalysisResponse, EmailData};

/// Default base URL for the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    /// Overridable so tests and proxies can point elsewhere.
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: OPENAI_DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }
}

impl OpenAiConfig {
    /// True when an API key is present and non-blank.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }
}

pub struct OpenAiProvider {
    client: Option<ChatClient>,
}

impl OpenAiProvider {
    /// A provider without a usable key is still constructed; it reports
    /// itself unconfigured and refuses to analyze.
    pub fn new(config: OpenAiConfig, http: reqwest::Client) -> Self {
        let client = if config.has_api_key() {
            config.api_key.map(|key| {
                let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
                ChatClient::new(http, "OpenAI", endpoint, config.model).with_api_key(key)
            })
        } else {
            None
        };
        Self { client }
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> String {
        "OpenAI GPT-4".to_string()
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn analyze(&self, email: &EmailData, trusted_contacts: &[String]) -> AnalysisResponse {
        let started = Instant::now();

        let Some(client) = &self.client else {
            return AnalysisResponse::failure("OpenAI API key not configured");
        };

        let outcome = run_analysis(client, Sampling::default(), email, trusted_contacts).await;
        into_response("openai", outcome, started)
    }
}
