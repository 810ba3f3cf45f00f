//! Persistence boundary — typed sqlx queries over the jobs/proposals tables.
//! Handlers and the scoring engine go through these functions; nothing else
//! touches SQL.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;

pub mod jobs;
pub mod proposals;

/// Dashboard counters, also broadcast on every mutation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatsSnapshot {
    pub total_jobs: i64,
    pub total_proposals: i64,
    pub tier1_count: i64,
    pub tier2_count: i64,
    pub tier3_count: i64,
    pub pending_count: i64,
}

pub async fn stats(pool: &PgPool) -> Result<StatsSnapshot, AppError> {
    let snapshot = sqlx::query_as::<_, StatsSnapshot>(
        r#"
        SELECT
            (SELECT count(*) FROM jobs)                      AS total_jobs,
            count(*)                                         AS total_proposals,
            count(*) FILTER (WHERE ai_tier = 1)              AS tier1_count,
            count(*) FILTER (WHERE ai_tier = 2)              AS tier2_count,
            count(*) FILTER (WHERE ai_tier = 3)              AS tier3_count,
            count(*) FILTER (WHERE ai_score IS NULL)         AS pending_count
        FROM proposals
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(snapshot)
}
