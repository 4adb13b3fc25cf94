//! LLM providers for scam analysis.
//!
//! Supports:
//! - **OpenAI**: cloud chat-completions API, selected when an API key is present
//! - **LM Studio**: any local OpenAI-compatible server
//!
//! Both variants share the prompt template, the wire client in [`chat`], and
//! the verdict normalization in [`crate::analysis`]. They are only ever built
//! from a [`ProviderConfig`], so the set of variants is closed.

pub mod chat;
pub mod lmstudio;
pub mod manager;
pub mod openai;

pub use chat::{ChatClient, Sampling};
pub use lmstudio::{LmStudioConfig, LmStudioProvider, LmStudioUpdate};
pub use manager::{ConnectionTest, ProviderManager};
pub use openai::{OpenAiConfig, OpenAiProvider};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::prompts::{SYSTEM_INSTRUCTION, render_prompt};
use crate::analysis::types::{AnalysisResponse, AnalysisResult, EmailData, RawAnalysis};
use crate::error::LlmError;

/// An interchangeable backend that turns an email into a verdict.
///
/// Implementations never return an error: every failure is folded into a
/// `success: false` envelope.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Human-readable name, e.g. `LM Studio (llama-3)`.
    fn name(&self) -> String;

    /// Whether the provider has what it needs to make a request.
    fn is_configured(&self) -> bool;

    /// Analyze one email. `trusted_contacts` may be empty.
    async fn analyze(&self, email: &EmailData, trusted_contacts: &[String]) -> AnalysisResponse;

    /// Concrete LM Studio provider, if this is one.
    fn as_lmstudio(&self) -> Option<&LmStudioProvider> {
        None
    }
}

/// Which provider variant a [`ProviderConfig`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    LmStudio,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "lmstudio" | "lm-studio" | "local" => Ok(ProviderKind::LmStudio),
            other => Err(format!("unknown provider '{other}' (expected openai or lmstudio)")),
        }
    }
}

/// Configuration for exactly one provider variant.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    LmStudio(LmStudioConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::OpenAi(_) => ProviderKind::OpenAi,
            ProviderConfig::LmStudio(_) => ProviderKind::LmStudio,
        }
    }
}

/// Build a provider, rejecting configurations it could not use.
pub fn create_provider(
    config: &ProviderConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn AnalysisProvider>, LlmError> {
    let provider: Arc<dyn AnalysisProvider> = match config {
        ProviderConfig::OpenAi(cfg) => Arc::new(OpenAiProvider::new(cfg.clone(), http)),
        ProviderConfig::LmStudio(cfg) => Arc::new(LmStudioProvider::new(cfg.clone(), http)),
    };

    if !provider.is_configured() {
        return Err(LlmError::NotConfigured {
            provider: provider.name(),
        });
    }

    tracing::info!(provider = %provider.name(), "AI provider created");
    Ok(provider)
}

/// Shared request/parse/normalize path used by both variants.
pub(crate) async fn run_analysis(
    client: &ChatClient,
    sampling: Sampling,
    email: &EmailData,
    trusted_contacts: &[String],
) -> Result<AnalysisResult, LlmError> {
    let prompt = render_prompt(email, trusted_contacts);
    let content = client.complete(SYSTEM_INSTRUCTION, &prompt, sampling).await?;
    let raw: RawAnalysis = serde_json::from_str(extract_json_object(&content))?;
    Ok(AnalysisResult::from_raw(raw))
}

/// Convert a `run_analysis` outcome into the envelope, with timing.
pub(crate) fn into_response(
    provider: &str,
    outcome: Result<AnalysisResult, LlmError>,
    started: Instant,
) -> AnalysisResponse {
    let elapsed = elapsed_ms(started);
    match outcome {
        Ok(result) => {
            tracing::info!(
                provider = provider,
                verdict = %result.verdict,
                confidence = result.confidence,
                elapsed_ms = elapsed,
                "Email analysis succeeded"
            );
            AnalysisResponse::success(result, elapsed)
        }
        Err(e) => {
            tracing::warn!(provider = provider, error = %e, elapsed_ms = elapsed, "Email analysis failed");
            AnalysisResponse::failure_after(e, elapsed)
        }
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Strip a markdown code fence the model may have wrapped around its JSON.
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn http() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[test]
    fn create_openai_requires_key() {
        let config = ProviderConfig::OpenAi(OpenAiConfig::default());
        let err = create_provider(&config, http()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured { .. }));

        let config = ProviderConfig::OpenAi(OpenAiConfig {
            api_key: Some(SecretString::from("sk-test")),
            ..OpenAiConfig::default()
        });
        let provider = create_provider(&config, http()).unwrap();
        assert_eq!(provider.name(), "OpenAI GPT-4");
        assert!(provider.is_configured());
    }

    #[test]
    fn create_lmstudio_requires_url_and_model() {
        let config = ProviderConfig::LmStudio(LmStudioConfig {
            base_url: String::new(),
            ..LmStudioConfig::default()
        });
        assert!(create_provider(&config, http()).is_err());

        let config = ProviderConfig::LmStudio(LmStudioConfig::default());
        let provider = create_provider(&config, http()).unwrap();
        assert_eq!(provider.name(), "LM Studio (meta-llama-3-8b-instruct)");
        assert!(provider.as_lmstudio().is_some());
    }

    #[test]
    fn provider_kind_parses() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("LMStudio".parse::<ProviderKind>().unwrap(), ProviderKind::LmStudio);
        assert!("bard".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn extract_json_handles_fences() {
        assert_eq!(extract_json_object("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(extract_json_object("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json_object("Here you go:\n```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json_object("not json"), "not json");
    }
}
