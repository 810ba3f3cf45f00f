//! Provider Adapter — uniform interface over interchangeable text-generation backends.
//!
//! ARCHITECTURAL RULE: no other module may talk to an AI vendor directly.
//! Backends implement a single stateless round trip (`TextBackend::complete`);
//! the retry/backoff and schema-validation policy lives in `ProviderAdapter`
//! so every vendor gets identical behavior.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod handlers;
pub mod mock;
pub mod openai;
pub mod prompts;
pub mod registry;

pub use factory::ProviderKind;
pub use registry::ProviderRegistry;

const MAX_ATTEMPTS: u32 = 3;

/// What a prompt is asking the provider to do. Rides on the request so the
/// mock backend and logging can tell calls apart; real backends ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Score,
    ExtractCriteria,
    ParseApplicants,
    Interview,
    Chat,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Score => "score",
            PromptMode::ExtractCriteria => "extract_criteria",
            PromptMode::ParseApplicants => "parse_applicants",
            PromptMode::Interview => "interview",
            PromptMode::Chat => "chat",
        }
    }
}

/// A prior conversation turn. Only chat mode carries history; every other
/// call is a fresh, self-contained request.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub mode: PromptMode,
    pub system: String,
    pub prompt: String,
    pub history: Vec<ChatTurn>,
    pub max_tokens: u32,
}

impl ProviderRequest {
    pub fn new(mode: PromptMode, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            mode,
            system: system.into(),
            prompt: prompt.into(),
            history: Vec::new(),
            max_tokens: 4096,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication with the provider failed: {0}")]
    Authentication(String),

    #[error("provider rate limit hit: {0}")]
    RateLimited(String),

    #[error("transport failure talking to the provider: {0}")]
    Transport(String),

    #[error("provider response did not match the expected schema: {0}")]
    MalformedResponse(String),

    #[error("provider API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned empty content")]
    EmptyContent,
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_) | ProviderError::Transport(_)
        )
    }

    /// Maps an HTTP status plus body into the error taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(message),
            429 => ProviderError::RateLimited(message),
            s if s >= 500 => ProviderError::Transport(message),
            _ => ProviderError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // Timeouts and connection failures are transport-level and retryable.
        ProviderError::Transport(e.to_string())
    }
}

/// One stateless round trip to a text-generation vendor.
#[async_trait]
pub trait TextBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn model(&self) -> &str;
    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}

/// Wraps a backend with the shared retry and schema-validation policy.
/// Cheap to clone; in-flight calls keep their backend even if the registry
/// swaps the active provider underneath them.
#[derive(Clone)]
pub struct ProviderAdapter {
    backend: Arc<dyn TextBackend>,
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("name", &self.backend.name())
            .finish()
    }
}

impl ProviderAdapter {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self { backend }
    }

    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn model(&self) -> String {
        self.backend.model().to_string()
    }

    /// Calls the backend, retrying rate-limit and transport failures with
    /// exponential backoff (1s, 2s). Authentication and other API errors
    /// surface immediately.
    async fn complete_with_backoff(
        &self,
        request: &ProviderRequest,
    ) -> Result<String, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "{} {} call attempt {} failed, retrying after {}ms...",
                    self.backend.name(),
                    request.mode.as_str(),
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.backend.complete(request).await {
                Ok(text) => {
                    debug!(
                        "{} {} call succeeded on attempt {}",
                        self.backend.name(),
                        request.mode.as_str(),
                        attempt + 1
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::Transport("retry budget exhausted".to_string())))
    }

    /// Calls the provider and deserializes the response into `T`.
    ///
    /// If the text does not parse into the expected schema, retries ONCE with
    /// a stricter JSON-only reminder appended, then surfaces
    /// `MalformedResponse`. This is separate from the transport retry: a call
    /// can succeed at the HTTP level and still fail schema validation.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        request: &ProviderRequest,
    ) -> Result<T, ProviderError> {
        let text = self.complete_with_backoff(request).await?;

        let first_failure = match parse_structured::<T>(&text) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        warn!(
            "{} {} response failed schema validation ({first_failure}), retrying with strict reminder",
            self.backend.name(),
            request.mode.as_str(),
        );

        let mut stricter = request.clone();
        stricter.prompt.push_str("\n\n");
        stricter.prompt.push_str(prompts::STRICT_JSON_RETRY);

        let text = self.complete_with_backoff(&stricter).await?;
        parse_structured::<T>(&text).map_err(ProviderError::MalformedResponse)
    }

    /// Free-form call returning raw text. Same transport retry, no schema step.
    pub async fn chat(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let text = self.complete_with_backoff(request).await?;
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyContent);
        }
        Ok(text)
    }
}

fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let stripped = strip_json_fences(text);
    let sliced = slice_json(stripped).unwrap_or(stripped);
    serde_json::from_str(sliced).map_err(|e| e.to_string())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Slices the outermost JSON object or array out of surrounding prose.
/// Models occasionally wrap JSON in commentary despite instructions.
fn slice_json(text: &str) -> Option<&str> {
    let first_obj = text.find('{');
    let first_arr = text.find('[');
    let start = match (first_obj, first_arr) {
        (Some(o), Some(a)) => o.min(a),
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };
    let end = if text.as_bytes()[start] == b'{' {
        text.rfind('}')
    } else {
        text.rfind(']')
    }?;
    (end > start).then(|| &text[start..=end])
}
