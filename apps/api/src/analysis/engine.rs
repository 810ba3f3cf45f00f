//! Scoring Engine — scores one proposal against its job's rubric and
//! persists a durable result.
//!
//! Flow: load proposal + job → build evaluation prompt → provider scoring
//! mode → clamp + tier + must-have override → single-statement persist →
//! fire-and-forget events.
//!
//! Tiering is a pure function of the returned score and the must-have flag;
//! nothing accumulates across calls, so re-scoring with a deterministic
//! provider is idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::prompts::{build_evaluation_prompt, EVALUATION_SYSTEM};
use crate::config::Config;
use crate::errors::AppError;
use crate::events::{Event, EventSink};
use crate::models::proposal::{ProposalRow, ProposalStatus};
use crate::provider::{PromptMode, ProviderAdapter, ProviderRequest};
use crate::store;
use crate::store::proposals::AiFieldsUpdate;

// ────────────────────────────────────────────────────────────────────────────
// Policy & pure scoring rules
// ────────────────────────────────────────────────────────────────────────────

/// Fixed tier cut-offs. Configuration constants, never computed.
#[derive(Debug, Clone, Copy)]
pub struct TierThresholds {
    /// score >= tier1 → Tier 1
    pub tier1: u8,
    /// tier2 <= score < tier1 → Tier 2; below → Tier 3
    pub tier2: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self { tier1: 85, tier2: 70 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScorePolicy {
    pub thresholds: TierThresholds,
    /// When true, a FORCED re-score may move a proposal off approved/rejected.
    pub rescore_overrides_decision: bool,
}

impl ScorePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            thresholds: TierThresholds {
                tier1: config.tier1_threshold,
                tier2: config.tier2_threshold,
            },
            rescore_overrides_decision: config.rescore_overrides_decision,
        }
    }
}

/// Structured scoring payload returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Evaluation {
    pub score: i64,
    /// Whether every must-have requirement was judged met. Signaled by the
    /// provider, not re-derived locally. Absent means no gate failed.
    #[serde(default = "default_passes")]
    pub passes_must_have: bool,
    pub reasoning: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
}

fn default_passes() -> bool {
    true
}

pub fn tier_for(score: u8, thresholds: &TierThresholds) -> i16 {
    if score >= thresholds.tier1 {
        1
    } else if score >= thresholds.tier2 {
        2
    } else {
        3
    }
}

/// Clamps an out-of-range provider score to [0,100]. Returns whether
/// clamping happened so it can be noted in the reasoning and logs.
pub fn clamp_score(raw: i64) -> (u8, bool) {
    if raw < 0 {
        (0, true)
    } else if raw > 100 {
        (100, true)
    } else {
        (raw as u8, false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedScore {
    pub score: u8,
    pub tier: i16,
    pub reasoning: String,
    pub status: ProposalStatus,
    pub clamped: bool,
}

/// Turns a provider evaluation into the durable result: clamp, tier,
/// must-have override, status transition.
pub fn apply_evaluation(
    evaluation: &Evaluation,
    current_status: ProposalStatus,
    policy: &ScorePolicy,
    force: bool,
) -> AppliedScore {
    let (score, clamped) = clamp_score(evaluation.score);

    let mut tier = tier_for(score, &policy.thresholds);
    // Must-have failure is an override, not a scoring input.
    if !evaluation.passes_must_have {
        tier = 3;
    }

    let mut reasoning = evaluation.reasoning.clone();
    if clamped {
        reasoning.push_str(&format!(
            " (provider score {} clamped to {score})",
            evaluation.score
        ));
    }

    let status = next_status(current_status, tier, policy, force);

    AppliedScore {
        score,
        tier,
        reasoning,
        status,
        clamped,
    }
}

/// Status transition rule. Automatic scoring owns pending/tier statuses and
/// moves them to the new tier; approved/rejected are human decisions and
/// survive re-scoring unless the operator both forces the run and has the
/// override policy enabled.
fn next_status(
    current: ProposalStatus,
    tier: i16,
    policy: &ScorePolicy,
    force: bool,
) -> ProposalStatus {
    if current.is_decided() && !(force && policy.rescore_overrides_decision) {
        current
    } else {
        ProposalStatus::for_tier(tier)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration
// ────────────────────────────────────────────────────────────────────────────

/// Everything a scoring call needs. The provider adapter is the one
/// snapshotted at call start; registry switches do not affect it.
pub struct ScoreContext<'a> {
    pub pool: &'a PgPool,
    pub provider: &'a ProviderAdapter,
    pub events: &'a dyn EventSink,
    pub policy: &'a ScorePolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub proposal_id: Uuid,
    pub score: u8,
    pub tier: i16,
    pub reasoning: String,
    pub recommendation: String,
    pub red_flags: Vec<String>,
    pub strengths: Vec<String>,
    pub status: ProposalStatus,
}

/// Scores a single proposal and persists the result.
///
/// `force` only affects the status policy (see `next_status`); the AI fields
/// are overwritten on every call.
pub async fn score_proposal(
    ctx: &ScoreContext<'_>,
    proposal_id: Uuid,
    force: bool,
) -> Result<ScoreResult, AppError> {
    let proposal = store::proposals::get(ctx.pool, proposal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proposal {proposal_id} not found")))?;

    let job = store::jobs::get(ctx.pool, proposal.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", proposal.job_id)))?;

    let criteria = job
        .parsed_criteria()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored criteria are corrupt: {e}")))?
        .ok_or_else(|| {
            AppError::Validation(format!("Job {} has no hiring criteria defined", job.id))
        })?;

    // Missing required fields fail immediately; there is nothing to retry.
    if proposal.cover_letter.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Proposal {proposal_id} has an empty cover letter"
        )));
    }

    let profile = proposal
        .profile()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored freelancer profile is corrupt: {e}")))?;

    ctx.events.publish(Event::activity(
        "analysis_started",
        format!("Analyzing proposal from {}", profile.name),
        json!({ "proposal_id": proposal_id }),
    ));

    let prompt = build_evaluation_prompt(&job, &criteria, &proposal, &profile);
    let request = ProviderRequest::new(PromptMode::Score, EVALUATION_SYSTEM, prompt);

    let evaluation: Evaluation = match ctx.provider.generate_structured(&request).await {
        Ok(evaluation) => evaluation,
        Err(e) => {
            let err = AppError::from(e);
            ctx.events.publish(Event::error(format!(
                "Analysis failed for proposal from {}: {}",
                profile.name,
                err.public().1
            )));
            return Err(err);
        }
    };

    let applied = apply_evaluation(&evaluation, proposal.parsed_status(), ctx.policy, force);
    if applied.clamped {
        warn!(
            "Provider returned out-of-range score {} for proposal {proposal_id}, clamped to {}",
            evaluation.score, applied.score
        );
    }

    store::proposals::update_ai_fields(
        ctx.pool,
        proposal_id,
        &AiFieldsUpdate {
            score: applied.score as i32,
            tier: applied.tier,
            reasoning: &applied.reasoning,
            recommendation: &evaluation.recommendation,
            red_flags: &evaluation.red_flags,
            strengths: &evaluation.strengths,
            status: applied.status,
        },
    )
    .await?;

    info!(
        "Evaluation complete for proposal {proposal_id}: score={}, tier={}",
        applied.score, applied.tier
    );
    ctx.events.publish(Event::activity(
        "analysis_complete",
        format!(
            "Analyzed {}: Tier {}, Score {}",
            profile.name, applied.tier, applied.score
        ),
        json!({ "proposal_id": proposal_id, "tier": applied.tier, "score": applied.score }),
    ));

    Ok(ScoreResult {
        proposal_id,
        score: applied.score,
        tier: applied.tier,
        reasoning: applied.reasoning,
        recommendation: evaluation.recommendation,
        red_flags: evaluation.red_flags,
        strengths: evaluation.strengths,
        status: applied.status,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Batch scoring
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub proposal_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub job_id: Uuid,
    /// Proposals selected for this run (excludes skipped).
    pub total: usize,
    pub scored: usize,
    pub failed: Vec<BatchFailure>,
    /// Already-scored proposals left alone because force was off.
    pub skipped: usize,
    /// Proposals never attempted because the batch was cancelled.
    pub cancelled: usize,
}

enum ItemResult {
    Scored,
    Failed(String),
    Cancelled,
}

/// Proposals a batch run should attempt. With `force` off, proposals that
/// already carry a score are skipped.
pub fn select_candidates(proposals: Vec<ProposalRow>, force: bool) -> (Vec<ProposalRow>, usize) {
    let total = proposals.len();
    let candidates: Vec<ProposalRow> = if force {
        proposals
    } else {
        proposals.into_iter().filter(|p| p.ai_score.is_none()).collect()
    };
    let skipped = total - candidates.len();
    (candidates, skipped)
}

/// Scores every candidate proposal under a job.
///
/// Proposals are processed independently with bounded concurrency; one
/// proposal's failure never aborts its siblings. Cancellation is cooperative:
/// the flag is checked before each proposal is dispatched, and an in-flight
/// provider call always runs to completion or timeout.
pub async fn score_job(
    ctx: &ScoreContext<'_>,
    job_id: Uuid,
    force: bool,
    concurrency: usize,
    cancel: Arc<AtomicBool>,
) -> Result<BatchOutcome, AppError> {
    if store::jobs::get(ctx.pool, job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let proposals = store::proposals::list_for_job(ctx.pool, job_id).await?;
    let (candidates, skipped) = select_candidates(proposals, force);
    let total = candidates.len();

    let mut outcome = BatchOutcome {
        job_id,
        total,
        scored: 0,
        failed: Vec::new(),
        skipped,
        cancelled: 0,
    };

    if total == 0 {
        return Ok(outcome);
    }

    ctx.events.publish(Event::progress(
        "analysis",
        0.0,
        format!("Starting analysis of {total} proposals"),
    ));

    let cancel = &cancel;
    let mut results = stream::iter(candidates.into_iter().map(|proposal| {
        let id = proposal.id;
        async move {
            if cancel.load(Ordering::Relaxed) {
                return (id, ItemResult::Cancelled);
            }
            match score_proposal(ctx, id, force).await {
                Ok(_) => (id, ItemResult::Scored),
                Err(e) => (id, ItemResult::Failed(e.public().1)),
            }
        }
    }))
    .buffer_unordered(concurrency.max(1));

    let mut done = 0usize;
    while let Some((proposal_id, result)) = results.next().await {
        done += 1;
        match result {
            ItemResult::Scored => outcome.scored += 1,
            ItemResult::Failed(error) => {
                warn!("Batch analysis failed for proposal {proposal_id}: {error}");
                outcome.failed.push(BatchFailure { proposal_id, error });
            }
            ItemResult::Cancelled => outcome.cancelled += 1,
        }

        ctx.events.publish(Event::progress(
            "analysis",
            done as f64 / total as f64,
            format!("Analyzed {done}/{total} proposals"),
        ));
    }

    info!(
        "Batch analysis for job {job_id} finished: {} scored, {} failed, {} skipped, {} cancelled",
        outcome.scored,
        outcome.failed.len(),
        outcome.skipped,
        outcome.cancelled
    );
    ctx.events.publish(Event::activity(
        "batch_analysis_complete",
        format!(
            "Batch analysis complete: {} scored, {} failed",
            outcome.scored,
            outcome.failed.len()
        ),
        json!({ "job_id": job_id, "scored": outcome.scored, "failed": outcome.failed.len() }),
    ));

    Ok(outcome)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn policy() -> ScorePolicy {
        ScorePolicy {
            thresholds: TierThresholds::default(),
            rescore_overrides_decision: false,
        }
    }

    fn evaluation(score: i64, passes_must_have: bool) -> Evaluation {
        Evaluation {
            score,
            passes_must_have,
            reasoning: "Solid profile with matching skills.".to_string(),
            recommendation: "Interview".to_string(),
            red_flags: vec![],
            strengths: vec![],
        }
    }

    fn row(ai_score: Option<i32>) -> ProposalRow {
        ProposalRow {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            freelancer: json!({}),
            cover_letter: "hello".to_string(),
            bid_amount: 100.0,
            estimated_duration: None,
            screening_answers: None,
            ai_score,
            ai_tier: ai_score.map(|_| 2),
            ai_reasoning: None,
            ai_recommendation: None,
            ai_red_flags: None,
            ai_strengths: None,
            status: "pending".to_string(),
            chat_history: None,
            interview_questions: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tier_boundaries() {
        let t = TierThresholds::default();
        assert_eq!(tier_for(0, &t), 3);
        assert_eq!(tier_for(69, &t), 3);
        assert_eq!(tier_for(70, &t), 2);
        assert_eq!(tier_for(84, &t), 2);
        assert_eq!(tier_for(85, &t), 1);
        assert_eq!(tier_for(100, &t), 1);
    }

    #[test]
    fn test_configurable_thresholds() {
        let t = TierThresholds { tier1: 90, tier2: 50 };
        assert_eq!(tier_for(89, &t), 2);
        assert_eq!(tier_for(90, &t), 1);
        assert_eq!(tier_for(49, &t), 3);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_score(130), (100, true));
        assert_eq!(clamp_score(-5), (0, true));
        assert_eq!(clamp_score(0), (0, false));
        assert_eq!(clamp_score(100), (100, false));
        assert_eq!(clamp_score(73), (73, false));
    }

    #[test]
    fn test_clamped_score_noted_in_reasoning() {
        let applied = apply_evaluation(&evaluation(130, true), ProposalStatus::Pending, &policy(), false);
        assert_eq!(applied.score, 100);
        assert!(applied.clamped);
        assert!(applied.reasoning.contains("clamped to 100"));
    }

    #[test]
    fn test_must_have_failure_forces_tier_3_even_at_100() {
        let applied = apply_evaluation(&evaluation(100, false), ProposalStatus::Pending, &policy(), false);
        assert_eq!(applied.score, 100);
        assert_eq!(applied.tier, 3);
        assert_eq!(applied.status, ProposalStatus::Tier3);
    }

    #[test]
    fn test_pending_status_advances_to_tier() {
        let applied = apply_evaluation(&evaluation(90, true), ProposalStatus::Pending, &policy(), false);
        assert_eq!(applied.tier, 1);
        assert_eq!(applied.status, ProposalStatus::Tier1);
    }

    #[test]
    fn test_tier_status_follows_rescore() {
        let applied = apply_evaluation(&evaluation(72, true), ProposalStatus::Tier1, &policy(), false);
        assert_eq!(applied.status, ProposalStatus::Tier2);
    }

    #[test]
    fn test_approved_status_survives_automatic_rescore() {
        let applied = apply_evaluation(&evaluation(95, true), ProposalStatus::Approved, &policy(), false);
        assert_eq!(applied.score, 95);
        assert_eq!(applied.tier, 1);
        assert_eq!(applied.status, ProposalStatus::Approved);
    }

    #[test]
    fn test_approved_status_survives_force_without_policy() {
        let applied = apply_evaluation(&evaluation(10, true), ProposalStatus::Approved, &policy(), true);
        assert_eq!(applied.status, ProposalStatus::Approved);
    }

    #[test]
    fn test_force_with_policy_overrides_decision() {
        let override_policy = ScorePolicy {
            thresholds: TierThresholds::default(),
            rescore_overrides_decision: true,
        };
        let applied =
            apply_evaluation(&evaluation(60, true), ProposalStatus::Rejected, &override_policy, true);
        assert_eq!(applied.status, ProposalStatus::Tier3);

        // Policy alone is not enough: an unforced re-score still preserves it.
        let unforced =
            apply_evaluation(&evaluation(60, true), ProposalStatus::Rejected, &override_policy, false);
        assert_eq!(unforced.status, ProposalStatus::Rejected);
    }

    #[test]
    fn test_apply_evaluation_is_idempotent() {
        let eval = evaluation(77, true);
        let first = apply_evaluation(&eval, ProposalStatus::Pending, &policy(), true);
        let second = apply_evaluation(&eval, ProposalStatus::Pending, &policy(), true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_evaluation_deserializes_from_provider_json() {
        let payload = r#"{
            "score": 88,
            "passes_must_have": true,
            "reasoning": "Strong storefront and tailored pitch.",
            "recommendation": "Interview within 48 hours",
            "red_flags": [],
            "strengths": ["Domain expertise", "Clear communication"]
        }"#;
        let evaluation: Evaluation = serde_json::from_str(payload).unwrap();
        assert_eq!(evaluation.score, 88);
        assert!(evaluation.passes_must_have);
        assert_eq!(evaluation.strengths.len(), 2);
    }

    #[test]
    fn test_evaluation_missing_gate_flag_defaults_to_passing() {
        let payload = r#"{"score": 50, "reasoning": "ok"}"#;
        let evaluation: Evaluation = serde_json::from_str(payload).unwrap();
        assert!(evaluation.passes_must_have);
    }

    #[test]
    fn test_select_candidates_skips_scored_without_force() {
        let proposals = vec![row(None), row(Some(80)), row(None)];
        let (candidates, skipped) = select_candidates(proposals, false);
        assert_eq!(candidates.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_select_candidates_force_takes_all() {
        let proposals = vec![row(None), row(Some(80))];
        let (candidates, skipped) = select_candidates(proposals, true);
        assert_eq!(candidates.len(), 2);
        assert_eq!(skipped, 0);
    }
}
