//! Criteria generation — extracts a rubric from a free-text job description
//! via the provider's extraction mode.

use tracing::info;

use crate::criteria::prompts::{EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM};
use crate::criteria::JobCriteria;
use crate::errors::AppError;
use crate::provider::{PromptMode, ProviderAdapter, ProviderRequest};

/// Best-effort rubric extraction. Fails when the provider is unreachable or
/// keeps returning unparseable structure; callers treat that as recoverable
/// (the user can fill criteria in manually).
pub async fn generate_from_description(
    provider: &ProviderAdapter,
    description: &str,
) -> Result<JobCriteria, AppError> {
    let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{job_description}", description);
    let request = ProviderRequest::new(PromptMode::ExtractCriteria, EXTRACTION_SYSTEM, prompt)
        .with_max_tokens(2000);

    let criteria: JobCriteria = provider.generate_structured(&request).await?;

    info!(
        "Generated criteria: {} must-have, {} nice-to-have, {} red flags",
        criteria.must_have.len(),
        criteria.nice_to_have.len(),
        criteria.red_flags.len()
    );
    Ok(criteria)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::DEFAULT_WEIGHT;

    #[test]
    fn test_prompt_template_fills_description() {
        let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{job_description}", "Build a Rust API");
        assert!(prompt.contains("Build a Rust API"));
        assert!(!prompt.contains("{job_description}"));
    }

    #[test]
    fn test_extraction_payload_with_word_weights_deserializes() {
        // Some providers answer with importance words despite the integer ask.
        let payload = r#"{
            "must_have": ["5+ years Rust"],
            "nice_to_have": [
                {"text": "axum experience", "weight": "High"},
                {"text": "CI/CD", "weight": 15},
                {"text": "Remote work", "weight": "unknown"}
            ],
            "red_flags": ["No code samples"]
        }"#;
        let criteria: JobCriteria = serde_json::from_str(payload).unwrap();
        assert_eq!(criteria.nice_to_have[0].weight, 20);
        assert_eq!(criteria.nice_to_have[1].weight, 15);
        assert_eq!(criteria.nice_to_have[2].weight, DEFAULT_WEIGHT);
    }
}
