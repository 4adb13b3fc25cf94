//! Email scam analysis: splitting, prompting, verdict normalization, and the
//! orchestrator the HTTP routes call.

pub mod analyzer;
pub mod parser;
pub mod prompts;
pub mod routes;
pub mod types;
pub mod verdict;

pub use analyzer::{EmailAnalyzer, MAX_EMAIL_CHARS, ProviderInfo};
pub use types::{
    AnalysisResponse, AnalysisResult, EmailData, VerdictAction, VerdictColor, VerdictLevel,
};
pub use verdict::VerdictConfig;
