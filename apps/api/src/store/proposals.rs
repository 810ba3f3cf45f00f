use anyhow::Context;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::proposal::{ProposalCreate, ProposalRow, ProposalStatus};

pub async fn insert(pool: &PgPool, request: &ProposalCreate) -> Result<ProposalRow, AppError> {
    let freelancer = serde_json::to_value(&request.freelancer)
        .context("Failed to serialize freelancer profile")?;

    let proposal = sqlx::query_as::<_, ProposalRow>(
        r#"
        INSERT INTO proposals
            (id, job_id, freelancer, cover_letter, bid_amount,
             estimated_duration, screening_answers, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.job_id)
    .bind(freelancer)
    .bind(&request.cover_letter)
    .bind(request.bid_amount)
    .bind(&request.estimated_duration)
    .bind(&request.screening_answers)
    .fetch_one(pool)
    .await?;

    Ok(proposal)
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<ProposalRow>, AppError> {
    let proposal = sqlx::query_as::<_, ProposalRow>("SELECT * FROM proposals WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(proposal)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<ProposalRow>, AppError> {
    let proposals =
        sqlx::query_as::<_, ProposalRow>("SELECT * FROM proposals ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;
    Ok(proposals)
}

pub async fn list_for_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<ProposalRow>, AppError> {
    let proposals = sqlx::query_as::<_, ProposalRow>(
        "SELECT * FROM proposals WHERE job_id = $1 ORDER BY created_at DESC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(proposals)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Human status override (approve/reject or manual tier move).
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: ProposalStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE proposals SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Parameters for the single-statement AI-fields update. The score, tier,
/// reasoning and status always land together; a partial triple is never
/// visible to readers.
pub struct AiFieldsUpdate<'a> {
    pub score: i32,
    pub tier: i16,
    pub reasoning: &'a str,
    pub recommendation: &'a str,
    pub red_flags: &'a [String],
    pub strengths: &'a [String],
    pub status: ProposalStatus,
}

pub async fn update_ai_fields(
    pool: &PgPool,
    id: Uuid,
    update: &AiFieldsUpdate<'_>,
) -> Result<bool, AppError> {
    let red_flags =
        serde_json::to_value(update.red_flags).context("Failed to serialize red flags")?;
    let strengths =
        serde_json::to_value(update.strengths).context("Failed to serialize strengths")?;

    let result = sqlx::query(
        r#"
        UPDATE proposals
        SET ai_score = $2,
            ai_tier = $3,
            ai_reasoning = $4,
            ai_recommendation = $5,
            ai_red_flags = $6,
            ai_strengths = $7,
            status = $8
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(update.score)
    .bind(update.tier)
    .bind(update.reasoning)
    .bind(update.recommendation)
    .bind(red_flags)
    .bind(strengths)
    .bind(update.status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_chat_history(
    pool: &PgPool,
    id: Uuid,
    history: &Value,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE proposals SET chat_history = $2 WHERE id = $1")
        .bind(id)
        .bind(history)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_interview_questions(
    pool: &PgPool,
    id: Uuid,
    questions: &Value,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE proposals SET interview_questions = $2 WHERE id = $1")
        .bind(id)
        .bind(questions)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
