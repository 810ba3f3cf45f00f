use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::criteria::JobCriteria;
use crate::errors::AppError;
use crate::models::job::{JobCreate, JobRow, JobWithCounts};

const COUNTS_SELECT: &str = r#"
    SELECT j.id, j.title, j.description, j.criteria, j.created_at,
           count(p.id)                              AS proposal_count,
           count(p.id) FILTER (WHERE p.ai_tier = 1) AS tier1_count,
           count(p.id) FILTER (WHERE p.ai_tier = 2) AS tier2_count,
           count(p.id) FILTER (WHERE p.ai_tier = 3) AS tier3_count
    FROM jobs j
    LEFT JOIN proposals p ON p.job_id = j.id
"#;

pub async fn insert(pool: &PgPool, request: &JobCreate) -> Result<JobRow, AppError> {
    let criteria = criteria_value(request.resolved_criteria().as_ref())?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, title, description, criteria)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.title)
    .bind(&request.description)
    .bind(criteria)
    .fetch_one(pool)
    .await?;

    Ok(job)
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, AppError> {
    let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(job)
}

pub async fn get_with_counts(pool: &PgPool, id: Uuid) -> Result<Option<JobWithCounts>, AppError> {
    let query = format!("{COUNTS_SELECT} WHERE j.id = $1 GROUP BY j.id");
    let job = sqlx::query_as::<_, JobWithCounts>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(job)
}

pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<JobWithCounts>, AppError> {
    let query = format!("{COUNTS_SELECT} GROUP BY j.id ORDER BY j.created_at DESC");
    let jobs = sqlx::query_as::<_, JobWithCounts>(&query)
        .fetch_all(pool)
        .await?;
    Ok(jobs)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    request: &JobCreate,
) -> Result<Option<JobRow>, AppError> {
    let criteria = criteria_value(request.resolved_criteria().as_ref())?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs
        SET title = $2, description = $3, criteria = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(criteria)
    .fetch_optional(pool)
    .await?;

    Ok(job)
}

/// Deletes a job and all of its proposals in one transaction.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM proposals WHERE job_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

fn criteria_value(criteria: Option<&JobCriteria>) -> Result<Option<serde_json::Value>, AppError> {
    criteria
        .map(|c| serde_json::to_value(c).context("Failed to serialize criteria"))
        .transpose()
        .map_err(AppError::Internal)
}
