//! Axum route handlers for the analysis API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::analysis::chat::investigate;
use crate::analysis::engine::{
    score_job, score_proposal, select_candidates, ScoreContext, ScorePolicy, ScoreResult,
};
use crate::analysis::interview::{generate_guide, InterviewConfig, InterviewGuide};
use crate::errors::AppError;
use crate::events::Event;
use crate::models::proposal::ChatMessage;
use crate::state::AppState;
use crate::store;

#[derive(Debug, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/analyze/:proposal_id
///
/// Scores a single proposal. Always re-runs the provider; `?force=true`
/// additionally lets the status policy reconsider a human decision.
pub async fn analyze_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<Uuid>,
    Query(query): Query<ForceQuery>,
) -> Result<Json<ScoreResult>, AppError> {
    let provider = state.providers.current().await?;
    let policy = ScorePolicy::from_config(&state.config);
    let ctx = ScoreContext {
        pool: &state.db,
        provider: &provider,
        events: state.events.as_ref(),
        policy: &policy,
    };

    let result = score_proposal(&ctx, proposal_id, query.force).await?;
    publish_stats(&state).await;

    Ok(Json(result))
}

/// POST /api/analyze/job/:job_id?force=
///
/// Kicks off batch analysis in the background and returns 202. Per-proposal
/// failures are isolated; progress and results stream over the event channel.
pub async fn analyze_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ForceQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if store::jobs::get(&state.db, job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let proposals = store::proposals::list_for_job(&state.db, job_id).await?;
    let (candidates, _) = select_candidates(proposals, query.force);
    if candidates.is_empty() {
        return Ok((
            StatusCode::OK,
            Json(json!({ "message": "No proposals to analyze", "queued": 0 })),
        ));
    }
    let queued = candidates.len();

    if !try_start_batch(&state, job_id, query.force).await? {
        return Err(AppError::Validation(format!(
            "Analysis is already running for job {job_id}"
        )));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!("Analysis started for {queued} proposals"),
            "status": "processing",
            "queued": queued,
        })),
    ))
}

/// Spawns a background batch for the job unless one is already running.
/// Also used by bulk import's auto-analyze.
pub async fn try_start_batch(
    state: &AppState,
    job_id: Uuid,
    force: bool,
) -> Result<bool, AppError> {
    // Snapshot the provider now: the batch runs on the adapter that was
    // active when it was requested.
    let provider = state.providers.current().await?;

    let Some(cancel) = state.batches.begin(job_id).await else {
        return Ok(false);
    };

    let task_state = state.clone();
    tokio::spawn(async move {
        let policy = ScorePolicy::from_config(&task_state.config);
        let ctx = ScoreContext {
            pool: &task_state.db,
            provider: &provider,
            events: task_state.events.as_ref(),
            policy: &policy,
        };

        let outcome = score_job(
            &ctx,
            job_id,
            force,
            task_state.config.batch_concurrency,
            cancel,
        )
        .await;
        task_state.batches.finish(job_id).await;

        match outcome {
            Ok(_) => publish_stats(&task_state).await,
            Err(e) => {
                error!("Batch analysis for job {job_id} aborted: {e}");
                task_state
                    .events
                    .publish(Event::error(format!("Batch analysis failed: {}", e.public().1)));
            }
        }
    });

    Ok(true)
}

/// POST /api/analyze/job/:job_id/cancel
///
/// Cooperative cancellation: proposals not yet dispatched are dropped, any
/// in-flight provider call runs to completion.
pub async fn cancel_job_analysis(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.batches.cancel(job_id).await {
        return Err(AppError::NotFound(format!(
            "No analysis running for job {job_id}"
        )));
    }
    Ok(Json(json!({ "message": "Cancellation requested" })))
}

/// POST /api/analyze/interview/:proposal_id
pub async fn interview_guide(
    State(state): State<AppState>,
    Path(proposal_id): Path<Uuid>,
    config: Option<Json<InterviewConfig>>,
) -> Result<Json<InterviewGuide>, AppError> {
    let provider = state.providers.current().await?;
    let guide = generate_guide(&state.db, &provider, proposal_id, config.map(|Json(c)| c)).await?;
    Ok(Json(guide))
}

/// POST /api/analyze/chat/:proposal_id
pub async fn chat_with_candidate(
    State(state): State<AppState>,
    Path(proposal_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    let provider = state.providers.current().await?;
    let reply = investigate(&state.db, &provider, proposal_id, &request.message).await?;
    Ok(Json(reply))
}

/// Pushes a fresh stats snapshot to dashboard clients. Failures only log;
/// stats are advisory.
pub async fn publish_stats(state: &AppState) {
    match store::stats(&state.db).await {
        Ok(snapshot) => match serde_json::to_value(&snapshot) {
            Ok(value) => state.events.publish(Event::stats(value)),
            Err(e) => error!("Failed to serialize stats: {e}"),
        },
        Err(e) => error!("Failed to load stats for broadcast: {e}"),
    }
}
