//! Axum route handlers for the jobs API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::handlers::publish_stats;
use crate::criteria::extraction::generate_from_description;
use crate::criteria::JobCriteria;
use crate::errors::AppError;
use crate::events::Event;
use crate::models::job::{GenerateCriteriaRequest, JobCreate, JobWithCounts};
use crate::state::AppState;
use crate::store;

const MIN_DESCRIPTION_LEN: usize = 10;

fn validate(request: &JobCreate) -> Result<(), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if request.title.len() > 200 {
        return Err(AppError::Validation(
            "title must be at most 200 characters".to_string(),
        ));
    }
    if request.description.trim().len() < MIN_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// POST /api/jobs
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<JobCreate>,
) -> Result<(StatusCode, Json<JobWithCounts>), AppError> {
    validate(&request)?;

    let job = store::jobs::insert(&state.db, &request).await?;

    state.events.publish(Event::activity(
        "job_created",
        format!("Created job: {}", job.title),
        json!({ "job_id": job.id }),
    ));
    publish_stats(&state).await;

    let job = store::jobs::get_with_counts(&state.db, job.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job.id)))?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobWithCounts>>, AppError> {
    let jobs = store::jobs::list_with_counts(&state.db).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobWithCounts>, AppError> {
    let job = store::jobs::get_with_counts(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// PUT /api/jobs/:id
///
/// Updates a job and its criteria. This is how auto-generated criteria get
/// edited before scoring.
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JobCreate>,
) -> Result<Json<JobWithCounts>, AppError> {
    validate(&request)?;

    let job = store::jobs::update(&state.db, id, &request)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    state.events.publish(Event::activity(
        "job_updated",
        format!("Updated job: {}", job.title),
        json!({ "job_id": id }),
    ));

    let job = store::jobs::get_with_counts(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
///
/// Deleting a job cascades to its proposals.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !store::jobs::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }

    state.events.publish(Event::activity(
        "job_deleted",
        format!("Deleted job: {id}"),
        json!({ "job_id": id }),
    ));
    publish_stats(&state).await;

    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

/// POST /api/jobs/generate-criteria
///
/// Extracts a hiring rubric from a job description. Recoverable on provider
/// failure: the caller can always fill criteria in manually.
pub async fn generate_criteria(
    State(state): State<AppState>,
    Json(request): Json<GenerateCriteriaRequest>,
) -> Result<Json<JobCriteria>, AppError> {
    if request.description.trim().len() < MIN_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }

    let provider = state.providers.current().await?;
    let criteria = generate_from_description(&provider, &request.description).await?;
    Ok(Json(criteria))
}
