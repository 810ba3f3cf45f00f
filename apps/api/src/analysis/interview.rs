//! Interview guide generation — tailored questions for a specific candidate.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::prompts::{INTERVIEW_PROMPT_TEMPLATE, INTERVIEW_SYSTEM};
use crate::errors::AppError;
use crate::models::proposal::InterviewQuestion;
use crate::provider::{PromptMode, ProviderAdapter, ProviderRequest};
use crate::store;

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    #[serde(default = "default_behavioral")]
    pub behavioral_count: u8,
    #[serde(default = "default_technical")]
    pub technical_count: u8,
    #[serde(default = "default_red_flag")]
    pub red_flag_count: u8,
    #[serde(default = "default_soft_skill")]
    pub soft_skill_count: u8,
    #[serde(default)]
    pub custom_focus: Option<String>,
}

fn default_behavioral() -> u8 {
    1
}
fn default_technical() -> u8 {
    2
}
fn default_red_flag() -> u8 {
    1
}
fn default_soft_skill() -> u8 {
    1
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            behavioral_count: default_behavioral(),
            technical_count: default_technical(),
            red_flag_count: default_red_flag(),
            soft_skill_count: default_soft_skill(),
            custom_focus: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InterviewGuide {
    pub proposal_id: Uuid,
    pub questions: Vec<InterviewQuestion>,
}

/// Generates (or returns the cached) interview guide for a proposal.
/// Passing an explicit config regenerates; otherwise stored questions win.
pub async fn generate_guide(
    pool: &PgPool,
    provider: &ProviderAdapter,
    proposal_id: Uuid,
    config: Option<InterviewConfig>,
) -> Result<InterviewGuide, AppError> {
    let proposal = store::proposals::get(pool, proposal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proposal {proposal_id} not found")))?;

    if config.is_none() {
        if let Some(stored) = &proposal.interview_questions {
            if let Ok(questions) = serde_json::from_value::<Vec<InterviewQuestion>>(stored.clone())
            {
                return Ok(InterviewGuide {
                    proposal_id,
                    questions,
                });
            }
        }
    }

    let job = store::jobs::get(pool, proposal.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", proposal.job_id)))?;

    let profile = proposal
        .profile()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored freelancer profile is corrupt: {e}")))?;

    let config = config.unwrap_or_default();
    let prompt = build_interview_prompt(
        &job.description,
        &profile.name,
        &profile.skills,
        profile.bio.as_deref().unwrap_or("N/A"),
        &proposal.cover_letter,
        &config,
    );

    let request = ProviderRequest::new(PromptMode::Interview, INTERVIEW_SYSTEM, prompt)
        .with_max_tokens(2000);

    let questions: Vec<InterviewQuestion> = provider.generate_structured(&request).await?;

    store::proposals::update_interview_questions(
        pool,
        proposal_id,
        &serde_json::to_value(&questions)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize questions: {e}")))?,
    )
    .await?;

    info!(
        "Generated {} interview questions for proposal {proposal_id}",
        questions.len()
    );

    Ok(InterviewGuide {
        proposal_id,
        questions,
    })
}

fn build_interview_prompt(
    job_description: &str,
    candidate_name: &str,
    skills: &[String],
    bio: &str,
    cover_letter: &str,
    config: &InterviewConfig,
) -> String {
    let custom_focus_line = config
        .custom_focus
        .as_deref()
        .map(|focus| format!("\nPay special attention to this topic: {focus}"))
        .unwrap_or_default();

    INTERVIEW_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{candidate_name}", candidate_name)
        .replace(
            "{skills}",
            &if skills.is_empty() {
                "none listed".to_string()
            } else {
                skills.join(", ")
            },
        )
        .replace("{bio}", bio)
        .replace("{cover_letter}", cover_letter)
        .replace("{behavioral_count}", &config.behavioral_count.to_string())
        .replace("{technical_count}", &config.technical_count.to_string())
        .replace("{red_flag_count}", &config.red_flag_count.to_string())
        .replace("{soft_skill_count}", &config.soft_skill_count.to_string())
        .replace("{custom_focus_line}", &custom_focus_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_prompt_fills_counts_and_focus() {
        let config = InterviewConfig {
            behavioral_count: 2,
            technical_count: 3,
            red_flag_count: 1,
            soft_skill_count: 0,
            custom_focus: Some("database migrations".to_string()),
        };
        let prompt = build_interview_prompt(
            "Build an API",
            "Jane Doe",
            &["Rust".to_string()],
            "Backend developer",
            "I would love to help.",
            &config,
        );

        assert!(prompt.contains("- 2 Behavioral"));
        assert!(prompt.contains("- 3 Technical"));
        assert!(prompt.contains("database migrations"));
        assert!(prompt.contains("Jane Doe"));
        assert!(!prompt.contains("{custom_focus_line}"));
    }

    #[test]
    fn test_interview_config_defaults() {
        let config: InterviewConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.behavioral_count, 1);
        assert_eq!(config.technical_count, 2);
        assert_eq!(config.red_flag_count, 1);
        assert_eq!(config.soft_skill_count, 1);
        assert!(config.custom_focus.is_none());
    }
}
