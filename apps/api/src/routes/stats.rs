use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::{self, StatsSnapshot};

/// GET /api/stats
/// Dashboard counters. The same snapshot is broadcast on every mutation.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsSnapshot>, AppError> {
    let snapshot = store::stats(&state.db).await?;
    Ok(Json(snapshot))
}
