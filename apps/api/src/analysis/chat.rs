//! Investigator chat — ask free-form questions about a candidate, grounded
//! strictly in the stored profile. The only provider mode that carries
//! conversation history.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::prompts::INVESTIGATOR_SYSTEM_TEMPLATE;
use crate::errors::AppError;
use crate::models::proposal::{ChatMessage, FreelancerProfile};
use crate::provider::{ChatTurn, PromptMode, ProviderAdapter, ProviderRequest};
use crate::store;

/// Number of stored turns handed to the provider as context.
const HISTORY_WINDOW: usize = 10;

pub async fn investigate(
    pool: &PgPool,
    provider: &ProviderAdapter,
    proposal_id: Uuid,
    message: &str,
) -> Result<ChatMessage, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let proposal = store::proposals::get(pool, proposal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proposal {proposal_id} not found")))?;

    let job = store::jobs::get(pool, proposal.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", proposal.job_id)))?;

    let profile = proposal
        .profile()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored freelancer profile is corrupt: {e}")))?;

    // Tolerate missing or corrupt stored history; chat should still work.
    let mut history: Vec<ChatMessage> = proposal
        .chat_history
        .as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default();

    let turns = recent_turns(&history, HISTORY_WINDOW);
    let system = build_system_prompt(&profile, &proposal.cover_letter, &job.description);

    let request = ProviderRequest::new(PromptMode::Chat, system, message)
        .with_history(turns)
        .with_max_tokens(1000);

    let reply = provider.chat(&request).await?;

    history.push(ChatMessage {
        role: "user".to_string(),
        content: message.to_string(),
        timestamp: Utc::now(),
    });
    let assistant = ChatMessage {
        role: "assistant".to_string(),
        content: reply,
        timestamp: Utc::now(),
    };
    history.push(assistant.clone());

    store::proposals::update_chat_history(
        pool,
        proposal_id,
        &serde_json::to_value(&history)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize chat history: {e}")))?,
    )
    .await?;

    Ok(assistant)
}

/// Last `window` user/assistant messages as provider turns. Other roles are
/// dropped, they would confuse role-alternation checks downstream.
fn recent_turns(history: &[ChatMessage], window: usize) -> Vec<ChatTurn> {
    let filtered: Vec<&ChatMessage> = history
        .iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .collect();
    filtered
        .iter()
        .rev()
        .take(window)
        .rev()
        .map(|m| ChatTurn {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect()
}

fn build_system_prompt(
    profile: &FreelancerProfile,
    cover_letter: &str,
    job_description: &str,
) -> String {
    INVESTIGATOR_SYSTEM_TEMPLATE
        .replace("{candidate_name}", &profile.name)
        .replace("{candidate_title}", &profile.title)
        .replace(
            "{skills}",
            &if profile.skills.is_empty() {
                "none listed".to_string()
            } else {
                profile.skills.join(", ")
            },
        )
        .replace("{bio}", profile.bio.as_deref().unwrap_or("N/A"))
        .replace(
            "{work_history}",
            profile.work_history_summary.as_deref().unwrap_or("N/A"),
        )
        .replace("{cover_letter}", cover_letter)
        .replace("{job_description}", job_description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_recent_turns_windows_the_tail() {
        let history: Vec<ChatMessage> = (0..15)
            .map(|i| msg(if i % 2 == 0 { "user" } else { "assistant" }, &format!("m{i}")))
            .collect();

        let turns = recent_turns(&history, 10);
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].content, "m5");
        assert_eq!(turns[9].content, "m14");
    }

    #[test]
    fn test_recent_turns_drops_foreign_roles() {
        let history = vec![msg("system", "boot"), msg("user", "hi"), msg("assistant", "hello")];
        let turns = recent_turns(&history, 10);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, "user");
    }

    #[test]
    fn test_system_prompt_embeds_profile() {
        let profile = FreelancerProfile {
            freelancer_id: "fl-1".to_string(),
            name: "Jane Doe".to_string(),
            title: "Rust Developer".to_string(),
            hourly_rate: None,
            job_success_score: None,
            total_earnings: None,
            top_rated_status: None,
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            bio: None,
            certifications: vec![],
            portfolio_items: vec![],
            work_history_summary: Some("5 years freelancing".to_string()),
            profile_url: None,
        };

        let system = build_system_prompt(&profile, "Pick me!", "Need an API built");
        assert!(system.contains("Jane Doe"));
        assert!(system.contains("Rust, SQL"));
        assert!(system.contains("5 years freelancing"));
        assert!(system.contains("Pick me!"));
        assert!(system.contains("Need an API built"));
    }
}
