//! Axum route handlers for the proposals API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::handlers::publish_stats;
use crate::errors::AppError;
use crate::events::Event;
use crate::models::proposal::{ProposalCreate, ProposalRow, ProposalStatus};
use crate::state::AppState;
use crate::store;

const MIN_COVER_LETTER_LEN: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ProposalFilter {
    #[serde(default)]
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// POST /api/proposals
pub async fn create_proposal(
    State(state): State<AppState>,
    Json(request): Json<ProposalCreate>,
) -> Result<(StatusCode, Json<ProposalRow>), AppError> {
    if request.cover_letter.trim().len() < MIN_COVER_LETTER_LEN {
        return Err(AppError::Validation(format!(
            "cover_letter must be at least {MIN_COVER_LETTER_LEN} characters"
        )));
    }
    if request.bid_amount <= 0.0 {
        return Err(AppError::Validation(
            "bid_amount must be positive".to_string(),
        ));
    }

    if store::jobs::get(&state.db, request.job_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Job {} not found",
            request.job_id
        )));
    }

    let proposal = store::proposals::insert(&state.db, &request).await?;

    state.events.publish(Event::activity(
        "proposal_created",
        format!("New proposal from {}", request.freelancer.name),
        json!({ "proposal_id": proposal.id, "job_id": request.job_id }),
    ));
    publish_stats(&state).await;

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// GET /api/proposals?job_id=
pub async fn list_proposals(
    State(state): State<AppState>,
    Query(filter): Query<ProposalFilter>,
) -> Result<Json<Vec<ProposalRow>>, AppError> {
    let proposals = match filter.job_id {
        Some(job_id) => store::proposals::list_for_job(&state.db, job_id).await?,
        None => store::proposals::list_all(&state.db).await?,
    };
    Ok(Json(proposals))
}

/// GET /api/proposals/:id
pub async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProposalRow>, AppError> {
    let proposal = store::proposals::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proposal {id} not found")))?;
    Ok(Json(proposal))
}

/// DELETE /api/proposals/:id
pub async fn delete_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !store::proposals::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Proposal {id} not found")));
    }

    state.events.publish(Event::activity(
        "proposal_deleted",
        format!("Deleted proposal: {id}"),
        json!({ "proposal_id": id }),
    ));
    publish_stats(&state).await;

    Ok(Json(json!({ "message": "Proposal deleted successfully" })))
}

/// PATCH /api/proposals/:id/status
///
/// Human override. An approve/reject set here is authoritative: automatic
/// re-scoring will not move it without the explicit override policy.
pub async fn update_proposal_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Value>, AppError> {
    let status = ProposalStatus::parse(&update.status).ok_or_else(|| {
        AppError::Validation(format!(
            "'{}' is not a valid status (expected pending, tier1, tier2, tier3, approved, or rejected)",
            update.status
        ))
    })?;

    if !store::proposals::update_status(&state.db, id, status).await? {
        return Err(AppError::NotFound(format!("Proposal {id} not found")));
    }

    state.events.publish(Event::activity(
        "status_updated",
        format!("Updated proposal {id} status to {}", status.as_str()),
        json!({ "proposal_id": id, "status": status.as_str() }),
    ));
    publish_stats(&state).await;

    Ok(Json(json!({ "message": "Status updated" })))
}
