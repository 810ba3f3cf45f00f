use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,

    /// Active AI provider name ("claude", "openai", "gemini", "mock").
    /// When unset, the provider is auto-detected from whichever API key is present.
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Forces the mock provider regardless of configured keys.
    pub mock_mode: bool,

    /// Bound on every provider round trip. A timeout surfaces as a transport error.
    pub provider_timeout_secs: u64,

    /// Tier 1 floor (score >= tier1_threshold). Must exceed tier2_threshold.
    pub tier1_threshold: u8,
    /// Tier 2 floor (score >= tier2_threshold).
    pub tier2_threshold: u8,

    /// Max proposals scored concurrently by a batch run.
    pub batch_concurrency: usize,

    /// Policy flag: whether a forced re-score may move a proposal off an
    /// approved/rejected status. The default keeps human decisions authoritative.
    pub rescore_overrides_decision: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            port: env_parse("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ai_provider: optional_env("AI_PROVIDER"),
            ai_model: optional_env("AI_MODEL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            mock_mode: env_parse("MOCK_MODE", false)?,
            provider_timeout_secs: env_parse("PROVIDER_TIMEOUT_SECS", 120)?,
            tier1_threshold: env_parse("TIER1_THRESHOLD", 85)?,
            tier2_threshold: env_parse("TIER2_THRESHOLD", 70)?,
            batch_concurrency: env_parse("BATCH_CONCURRENCY", 4)?,
            rescore_overrides_decision: env_parse("RESCORE_OVERRIDES_DECISION", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tier1_threshold <= self.tier2_threshold {
            bail!(
                "TIER1_THRESHOLD ({}) must be greater than TIER2_THRESHOLD ({})",
                self.tier1_threshold,
                self.tier2_threshold
            );
        }
        if self.tier1_threshold > 100 {
            bail!("TIER1_THRESHOLD must be at most 100");
        }
        if self.batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be at least 1");
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
