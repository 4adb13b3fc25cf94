//! Provider selection and runtime switching.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{
    AnalysisProvider, LmStudioUpdate, ProviderConfig, ProviderKind, create_provider, elapsed_ms,
};
use crate::analysis::types::EmailData;
use crate::config::AiSettings;

/// Text sent by [`ProviderManager::test_connection`].
const PROBE_TEXT: &str = "Test message";

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time: u64,
}

/// Holds the active provider. Built from explicit settings; there is no
/// process-wide default instance.
pub struct ProviderManager {
    http: reqwest::Client,
    current: RwLock<Option<Arc<dyn AnalysisProvider>>>,
}

impl ProviderManager {
    /// Build with a single explicit provider configuration.
    ///
    /// An unusable configuration leaves the manager without a provider.
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self {
        let provider = match create_provider(&config, http.clone()) {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!(kind = ?config.kind(), error = %e, "AI provider will not be available");
                None
            }
        };
        Self {
            http,
            current: RwLock::new(provider),
        }
    }

    /// Manager around an already-built provider.
    pub fn with_provider(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            current: RwLock::new(Some(provider)),
        }
    }

    /// Manager with no provider at all.
    pub fn empty(http: reqwest::Client) -> Self {
        Self {
            http,
            current: RwLock::new(None),
        }
    }

    /// Apply the selection policy: an explicit `preferred` kind wins,
    /// otherwise OpenAI when an API key is present, otherwise LM Studio.
    pub fn from_settings(settings: &AiSettings, http: reqwest::Client) -> Self {
        let kind = settings.preferred.unwrap_or(if settings.openai.has_api_key() {
            ProviderKind::OpenAi
        } else {
            ProviderKind::LmStudio
        });
        info!(kind = ?kind, explicit = settings.preferred.is_some(), "Selecting AI provider");
        Self::new(settings.config_for(kind), http)
    }

    /// The active provider, if any. Callers keep the `Arc` for the whole call,
    /// so a concurrent switch does not affect it.
    pub async fn provider(&self) -> Option<Arc<dyn AnalysisProvider>> {
        self.current.read().await.clone()
    }

    pub async fn provider_name(&self) -> String {
        match self.current.read().await.as_ref() {
            Some(provider) => provider.name(),
            None => "No Provider".to_string(),
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|p| p.is_configured())
    }

    /// Replace the active provider. On failure the previous provider stays.
    pub async fn switch_provider(&self, config: ProviderConfig) -> bool {
        match create_provider(&config, self.http.clone()) {
            Ok(provider) => {
                let name = provider.name();
                *self.current.write().await = Some(provider);
                info!(provider = %name, "Switched AI provider");
                true
            }
            Err(e) => {
                warn!(kind = ?config.kind(), error = %e, "Provider switch rejected");
                false
            }
        }
    }

    /// Patch the LM Studio settings in place. Fails if another provider is active.
    pub async fn update_local_config(&self, update: LmStudioUpdate) -> bool {
        let guard = self.current.read().await;
        match guard.as_ref().and_then(|p| p.as_lmstudio()) {
            Some(local) => {
                local.update_config(update);
                true
            }
            None => false,
        }
    }

    /// Run one real analysis of a trivial message and time it.
    pub async fn test_connection(&self) -> ConnectionTest {
        let started = Instant::now();
        let Some(provider) = self.provider().await else {
            return ConnectionTest {
                success: false,
                error: Some("No provider configured".to_string()),
                response_time: elapsed_ms(started),
            };
        };

        let response = provider.analyze(&EmailData::from_body(PROBE_TEXT), &[]).await;
        ConnectionTest {
            success: response.success,
            error: response.error,
            response_time: elapsed_ms(started),
        }
    }
}
