pub mod health;
pub mod stats;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::events;
use crate::import::handlers as import;
use crate::jobs::handlers as jobs;
use crate::proposals::handlers as proposals;
use crate::provider::handlers as ai;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/ws", get(events::ws_handler))
        .route("/api/stats", get(stats::stats_handler))
        // Jobs
        .route("/api/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/api/jobs/generate-criteria", post(jobs::generate_criteria))
        .route(
            "/api/jobs/:id",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        // Proposals
        .route(
            "/api/proposals",
            post(proposals::create_proposal).get(proposals::list_proposals),
        )
        .route(
            "/api/proposals/:id",
            get(proposals::get_proposal).delete(proposals::delete_proposal),
        )
        .route(
            "/api/proposals/:id/status",
            patch(proposals::update_proposal_status),
        )
        // Analysis
        .route("/api/analyze/:proposal_id", post(analysis::analyze_proposal))
        .route("/api/analyze/job/:job_id", post(analysis::analyze_job))
        .route(
            "/api/analyze/job/:job_id/cancel",
            post(analysis::cancel_job_analysis),
        )
        .route(
            "/api/analyze/interview/:proposal_id",
            post(analysis::interview_guide),
        )
        .route(
            "/api/analyze/chat/:proposal_id",
            post(analysis::chat_with_candidate),
        )
        // Bulk import
        .route("/api/import/parse", post(import::parse_import))
        .route("/api/import/upload", post(import::upload_import))
        .route("/api/import/confirm", post(import::confirm_import_handler))
        // AI provider configuration
        .route("/api/ai/providers", get(ai::list_providers))
        .route("/api/ai/switch", post(ai::switch_provider))
        .with_state(state)
}
