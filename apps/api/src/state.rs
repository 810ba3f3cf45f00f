use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::BatchTracker;
use crate::config::Config;
use crate::events::{EventSink, WsBroadcaster};
use crate::provider::ProviderRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Active AI provider, swappable at runtime via /api/ai/switch.
    pub providers: Arc<ProviderRegistry>,
    /// Concrete broadcaster handle, needed by the /ws route to subscribe.
    pub broadcaster: Arc<WsBroadcaster>,
    /// The same broadcaster as an injected publish interface; scoring and CRUD
    /// code depends on this trait, never on the transport.
    pub events: Arc<dyn EventSink>,
    pub config: Config,
    /// Running batch analyses, for duplicate refusal and cancellation.
    pub batches: Arc<BatchTracker>,
}
