//! Axum route handlers for runtime provider configuration.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::AppError;
use crate::events::Event;
use crate::provider::factory;
use crate::provider::ProviderKind;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub available: Vec<&'static str>,
    pub current: Option<CurrentProvider>,
}

#[derive(Debug, Serialize)]
pub struct CurrentProvider {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// GET /api/ai/providers
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let current = state
        .providers
        .descriptor()
        .await
        .map(|(provider, model)| CurrentProvider { provider, model });

    Json(ProvidersResponse {
        available: factory::available_providers(&state.config),
        current,
    })
}

/// POST /api/ai/switch
///
/// Swaps the active provider. In-flight calls finish on the provider they
/// started with; only subsequent calls use the new one.
pub async fn switch_provider(
    State(state): State<AppState>,
    Json(request): Json<SwitchRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind: ProviderKind = request
        .provider
        .parse()
        .map_err(|e: anyhow::Error| AppError::Validation(e.to_string()))?;

    let adapter = factory::create_adapter(kind, request.model.clone(), &state.config)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let model = adapter.model();
    state.providers.switch(adapter).await;

    state.events.publish(Event::activity(
        "provider_switched",
        format!("Switched AI provider to {}", kind.as_str()),
        json!({ "provider": kind.as_str(), "model": model }),
    ));

    Ok(Json(json!({
        "status": "success",
        "message": format!("Successfully switched to {}", kind.as_str()),
        "provider": kind.as_str(),
        "model": model,
    })))
}
