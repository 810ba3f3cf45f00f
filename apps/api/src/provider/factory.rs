//! Backend construction and provider auto-detection.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;
use crate::provider::anthropic::AnthropicBackend;
use crate::provider::gemini::GeminiBackend;
use crate::provider::mock::MockBackend;
use crate::provider::openai::OpenAiBackend;
use crate::provider::{ProviderAdapter, TextBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    OpenAi,
    Gemini,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mock => "mock",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => bail!("Unknown AI provider '{other}'. Supported: claude, openai, gemini, mock"),
        }
    }
}

/// Builds an adapter for the requested provider, using the key from config.
/// `model` overrides the per-provider default when given.
pub fn create_adapter(
    kind: ProviderKind,
    model: Option<String>,
    config: &Config,
) -> Result<ProviderAdapter> {
    let timeout = Duration::from_secs(config.provider_timeout_secs);
    let model = model.or_else(|| config.ai_model.clone());

    let backend: Arc<dyn TextBackend> = match kind {
        ProviderKind::Claude => {
            let Some(api_key) = config.anthropic_api_key.clone() else {
                bail!("ANTHROPIC_API_KEY is not configured");
            };
            Arc::new(AnthropicBackend::new(api_key, model, timeout)?)
        }
        ProviderKind::OpenAi => {
            let Some(api_key) = config.openai_api_key.clone() else {
                bail!("OPENAI_API_KEY is not configured");
            };
            Arc::new(OpenAiBackend::new(api_key, model, timeout)?)
        }
        ProviderKind::Gemini => {
            let Some(api_key) = config.gemini_api_key.clone() else {
                bail!("GEMINI_API_KEY is not configured");
            };
            Arc::new(GeminiBackend::new(api_key, model, timeout)?)
        }
        ProviderKind::Mock => Arc::new(MockBackend),
    };

    Ok(ProviderAdapter::new(backend))
}

/// Picks the startup provider: explicit MOCK_MODE or AI_PROVIDER first,
/// then whichever API key happens to be present.
pub fn detect(config: &Config) -> Option<ProviderKind> {
    if config.mock_mode {
        info!("MOCK_MODE enabled, using the mock AI provider");
        return Some(ProviderKind::Mock);
    }
    if let Some(name) = &config.ai_provider {
        match name.parse::<ProviderKind>() {
            Ok(kind) => return Some(kind),
            Err(e) => {
                tracing::warn!("{e}");
                return None;
            }
        }
    }
    if config.openai_api_key.is_some() {
        info!("Auto-detected OpenAI provider (OPENAI_API_KEY found)");
        Some(ProviderKind::OpenAi)
    } else if config.anthropic_api_key.is_some() {
        info!("Auto-detected Claude provider (ANTHROPIC_API_KEY found)");
        Some(ProviderKind::Claude)
    } else if config.gemini_api_key.is_some() {
        info!("Auto-detected Gemini provider (GEMINI_API_KEY found)");
        Some(ProviderKind::Gemini)
    } else {
        None
    }
}

/// Providers that could be activated right now, based on configured keys.
pub fn available_providers(config: &Config) -> Vec<&'static str> {
    let mut available = Vec::new();
    if config.openai_api_key.is_some() {
        available.push("openai");
    }
    if config.anthropic_api_key.is_some() {
        available.push("claude");
    }
    if config.gemini_api_key.is_some() {
        available.push("gemini");
    }
    available.push("mock");
    available
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> Config {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            ai_provider: None,
            ai_model: None,
            anthropic_api_key: None,
            openai_api_key: None,
            gemini_api_key: None,
            mock_mode: false,
            provider_timeout_secs: 120,
            tier1_threshold: 85,
            tier2_threshold: 70,
            batch_concurrency: 4,
            rescore_overrides_decision: false,
        }
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("OPENAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("cohere".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_detect_prefers_mock_mode() {
        let mut config = bare_config();
        config.mock_mode = true;
        config.openai_api_key = Some("sk-test".to_string());
        assert_eq!(detect(&config), Some(ProviderKind::Mock));
    }

    #[test]
    fn test_detect_from_available_key() {
        let mut config = bare_config();
        config.anthropic_api_key = Some("sk-ant-test".to_string());
        assert_eq!(detect(&config), Some(ProviderKind::Claude));
    }

    #[test]
    fn test_detect_none_without_keys() {
        assert_eq!(detect(&bare_config()), None);
    }

    #[test]
    fn test_create_adapter_requires_key() {
        let err = create_adapter(ProviderKind::Claude, None, &bare_config()).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_mock_needs_no_key() {
        let adapter = create_adapter(ProviderKind::Mock, None, &bare_config()).unwrap();
        assert_eq!(adapter.name(), "mock");
    }

    #[test]
    fn test_available_always_includes_mock() {
        assert_eq!(available_providers(&bare_config()), vec!["mock"]);
    }
}
