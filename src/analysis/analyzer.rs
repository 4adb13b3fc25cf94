//! Analysis orchestrator. The HTTP layer calls into this only.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tracing::{error, info};

use super::types::{AnalysisResponse, EmailData};
use crate::error::AnalysisError;
use crate::llm::ProviderManager;

/// Longest email accepted, in characters.
pub const MAX_EMAIL_CHARS: usize = 10_000;

/// Name and readiness of the active provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub configured: bool,
}

/// Validates input and hands it to whichever provider is active.
#[derive(Clone)]
pub struct EmailAnalyzer {
    providers: Arc<ProviderManager>,
}

impl EmailAnalyzer {
    pub fn new(providers: Arc<ProviderManager>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &Arc<ProviderManager> {
        &self.providers
    }

    /// Analyze one email. Never fails: every problem comes back as a
    /// `success: false` envelope.
    pub async fn analyze_email(
        &self,
        email: &EmailData,
        trusted_contacts: &[String],
    ) -> AnalysisResponse {
        if let Err(e) = validate(email) {
            info!(error = %e, "Rejected email before analysis");
            return AnalysisResponse::failure(e);
        }

        let Some(provider) = self.providers.provider().await else {
            return AnalysisResponse::failure(AnalysisError::NoProvider);
        };

        let call = provider.analyze(email, trusted_contacts);
        let response = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(response) => response,
            Err(_) => {
                error!(provider = %provider.name(), "Provider panicked during analysis");
                return AnalysisResponse::failure(AnalysisError::Unexpected);
            }
        };

        info!(
            provider = %provider.name(),
            success = response.success,
            processing_time_ms = ?response.processing_time,
            "Analysis completed"
        );
        response
    }

    pub async fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.providers.provider_name().await,
            configured: self.providers.is_configured().await,
        }
    }
}

fn validate(email: &EmailData) -> Result<(), AnalysisError> {
    if email.raw_text.trim().is_empty() {
        return Err(AnalysisError::EmptyContent);
    }
    let length = email.raw_text.chars().count();
    if length > MAX_EMAIL_CHARS {
        return Err(AnalysisError::ContentTooLong {
            length,
            max: MAX_EMAIL_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::analysis::parser;
    use crate::analysis::types::{AnalysisResult, RawAnalysis};
    use crate::llm::{AnalysisProvider, LmStudioConfig, OpenAiConfig, ProviderConfig};

    /// Stub provider that records calls instead of touching the network.
    struct StubProvider {
        calls: Arc<AtomicUsize>,
        panic: bool,
    }

    #[async_trait]
    impl AnalysisProvider for StubProvider {
        fn name(&self) -> String {
            "stub".to_string()
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn analyze(&self, _email: &EmailData, contacts: &[String]) -> AnalysisResponse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("provider blew up");
            }
            let mut result = AnalysisResult::from_raw(RawAnalysis::default());
            result.risk_factors = contacts.to_vec();
            AnalysisResponse::success(result, 1)
        }
    }

    fn analyzer_with_stub(panic: bool) -> (EmailAnalyzer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = Arc::new(ProviderManager::with_provider(Arc::new(StubProvider {
            calls: Arc::clone(&calls),
            panic,
        })));
        (EmailAnalyzer::new(manager), calls)
    }

    #[tokio::test]
    async fn empty_and_whitespace_rejected_without_call() {
        let (analyzer, calls) = analyzer_with_stub(false);
        for raw in ["", "   ", "\n\t\n"] {
            let response = analyzer.analyze_email(&parser::parse(raw), &[]).await;
            assert!(!response.success);
            assert_eq!(
                response.error.as_deref(),
                Some("Email content is required for analysis")
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_rejected_without_call() {
        let (analyzer, calls) = analyzer_with_stub(false);
        let raw = "a".repeat(MAX_EMAIL_CHARS + 1);
        let response = analyzer.analyze_email(&parser::parse(&raw), &[]).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("too long"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let exact = "é".repeat(MAX_EMAIL_CHARS);
        let response = analyzer.analyze_email(&parser::parse(&exact), &[]).await;
        assert!(response.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_provider_configured() {
        let analyzer = EmailAnalyzer::new(Arc::new(ProviderManager::new(
            ProviderConfig::OpenAi(OpenAiConfig::default()),
            reqwest::Client::new(),
        )));
        let response = analyzer
            .analyze_email(&parser::parse("Hello grandma"), &[])
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("No AI provider configured"));

        let info = analyzer.provider_info().await;
        assert_eq!(info.name, "No Provider");
        assert!(!info.configured);
    }

    #[tokio::test]
    async fn passes_contacts_through() {
        let (analyzer, calls) = analyzer_with_stub(false);
        let contacts = vec!["Mary (child)".to_string()];
        let response = analyzer
            .analyze_email(&parser::parse("Hi, it's your grandson"), &contacts)
            .await;
        assert!(response.success);
        assert_eq!(response.result.unwrap().risk_factors, contacts);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_panic_becomes_generic_error() {
        let (analyzer, calls) = analyzer_with_stub(true);
        let response = analyzer
            .analyze_email(&parser::parse("anything"), &[])
            .await;
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("An unexpected error occurred during analysis")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_switch_keeps_working_provider() {
        let (analyzer, calls) = analyzer_with_stub(false);
        let switched = analyzer
            .providers()
            .switch_provider(ProviderConfig::LmStudio(LmStudioConfig {
                base_url: String::new(),
                ..LmStudioConfig::default()
            }))
            .await;
        assert!(!switched);

        let response = analyzer
            .analyze_email(&parser::parse("Lunch on Sunday?"), &[])
            .await;
        assert!(response.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.provider_info().await.name, "stub");
    }
}
