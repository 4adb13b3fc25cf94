//! Configuration types.
//!
//! Everything is passed explicitly at construction time. `from_env()` only
//! produces a default; a caller that builds [`AiSettings`] or
//! [`crate::llm::ProviderConfig`] itself overrides the environment entirely.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::lmstudio::{LMSTUDIO_DEFAULT_MODEL, LMSTUDIO_DEFAULT_URL};
use crate::llm::openai::{OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL};
use crate::llm::{LmStudioConfig, OpenAiConfig, ProviderConfig, ProviderKind};

/// AI provider settings consumed by [`crate::llm::ProviderManager::from_settings`].
#[derive(Debug, Clone, Default)]
pub struct AiSettings {
    /// Explicit provider choice. When `None`, OpenAI is used if it has a key.
    pub preferred: Option<ProviderKind>,
    pub openai: OpenAiConfig,
    pub lmstudio: LmStudioConfig,
}

impl AiSettings {
    /// Read provider settings from the environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `AI_PROVIDER` | unset (auto) |
    /// | `OPENAI_API_KEY` | unset |
    /// | `OPENAI_MODEL` | `gpt-4` |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    /// | `LM_STUDIO_BASE_URL` | `http://localhost:1234` |
    /// | `LM_STUDIO_MODEL` | `meta-llama-3-8b-instruct` |
    /// | `LM_STUDIO_TEMPERATURE` | `0.3` |
    /// | `LM_STUDIO_MAX_TOKENS` | `1000` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let preferred = match get("AI_PROVIDER").filter(|s| !s.trim().is_empty()) {
            Some(value) => Some(value.parse::<ProviderKind>().map_err(|message| {
                ConfigError::InvalidValue {
                    key: "AI_PROVIDER".to_string(),
                    message,
                }
            })?),
            None => None,
        };

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            model: get("OPENAI_MODEL").unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
        };

        let defaults = LmStudioConfig::default();
        let lmstudio = LmStudioConfig {
            base_url: get("LM_STUDIO_BASE_URL").unwrap_or_else(|| LMSTUDIO_DEFAULT_URL.to_string()),
            model: get("LM_STUDIO_MODEL").unwrap_or_else(|| LMSTUDIO_DEFAULT_MODEL.to_string()),
            temperature: parse_or(&get, "LM_STUDIO_TEMPERATURE", defaults.temperature)?,
            max_tokens: parse_or(&get, "LM_STUDIO_MAX_TOKENS", defaults.max_tokens)?,
        };

        Ok(Self {
            preferred,
            openai,
            lmstudio,
        })
    }

    /// Provider configuration for the given variant.
    pub fn config_for(&self, kind: ProviderKind) -> ProviderConfig {
        match kind {
            ProviderKind::OpenAi => ProviderConfig::OpenAi(self.openai.clone()),
            ProviderKind::LmStudio => ProviderConfig::LmStudio(self.lmstudio.clone()),
        }
    }
}

/// Whole-service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub ai: AiSettings,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// `SCAM_GUARD_HOST` (0.0.0.0), `SCAM_GUARD_PORT` (3000) and
    /// `SCAM_GUARD_DB_PATH` (`./data/scam-guard.db`), plus everything
    /// [`AiSettings::from_env`] reads.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get("SCAM_GUARD_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&get, "SCAM_GUARD_PORT", 3000)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "SCAM_GUARD_HOST".to_string(),
                    message: format!("{host}:{port} is not a socket address: {e}"),
                })?;

        let database_path = get("SCAM_GUARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/scam-guard.db"));

        Ok(Self {
            bind_addr,
            database_path,
            ai: AiSettings::from_lookup(get)?,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key).filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.database_path, PathBuf::from("./data/scam-guard.db"));
        assert!(config.ai.preferred.is_none());
        assert!(!config.ai.openai.has_api_key());
        assert_eq!(config.ai.openai.model, "gpt-4");
        assert_eq!(config.ai.lmstudio, LmStudioConfig::default());
    }

    #[test]
    fn reads_provider_settings() {
        let ai = AiSettings::from_lookup(lookup(&[
            ("AI_PROVIDER", "lmstudio"),
            ("OPENAI_API_KEY", "sk-live"),
            ("LM_STUDIO_BASE_URL", "https://tunnel.example.com"),
            ("LM_STUDIO_MODEL", "qwen2.5-7b"),
            ("LM_STUDIO_TEMPERATURE", "0.1"),
            ("LM_STUDIO_MAX_TOKENS", "512"),
        ]))
        .unwrap();
        assert_eq!(ai.preferred, Some(ProviderKind::LmStudio));
        assert!(ai.openai.has_api_key());
        assert_eq!(ai.lmstudio.base_url, "https://tunnel.example.com");
        assert_eq!(ai.lmstudio.model, "qwen2.5-7b");
        assert_eq!(ai.lmstudio.max_tokens, 512);
    }

    #[test]
    fn blank_api_key_is_absent() {
        let ai = AiSettings::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(ai.openai.api_key.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AiSettings::from_lookup(lookup(&[("AI_PROVIDER", "bard")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("SCAM_GUARD_PORT", "http")])).is_err());
        assert!(AiSettings::from_lookup(lookup(&[("LM_STUDIO_MAX_TOKENS", "-5")])).is_err());
    }
}
