mod analysis;
mod config;
mod criteria;
mod db;
mod errors;
mod events;
mod import;
mod jobs;
mod models;
mod proposals;
mod provider;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::BatchTracker;
use crate::config::Config;
use crate::db::create_pool;
use crate::events::WsBroadcaster;
use crate::provider::{factory, ProviderRegistry};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Triage API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and apply pending migrations
    let db = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    // Initialize the AI provider (auto-detected from configured keys).
    // The service still starts without one; AI endpoints return 503 until a
    // provider is configured via /api/ai/switch.
    let initial = match factory::detect(&config) {
        Some(kind) => match factory::create_adapter(kind, None, &config) {
            Ok(adapter) => {
                info!(
                    "AI provider initialized: {} (model: {})",
                    adapter.name(),
                    adapter.model()
                );
                Some(adapter)
            }
            Err(e) => {
                warn!("Failed to initialize AI provider: {e}");
                None
            }
        },
        None => {
            warn!("No AI provider configured - AI analysis will be unavailable");
            None
        }
    };
    let providers = Arc::new(ProviderRegistry::new(initial));

    // Initialize the WebSocket event broadcaster
    let broadcaster = Arc::new(WsBroadcaster::new(256));

    // Build app state
    let state = AppState {
        db,
        providers,
        events: broadcaster.clone(),
        broadcaster,
        config: config.clone(),
        batches: Arc::new(BatchTracker::default()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
