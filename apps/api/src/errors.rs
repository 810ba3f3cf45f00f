use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::provider::ProviderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("No AI provider configured: {0}")]
    ProviderUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error code plus a client-safe message. Raw provider and database error
    /// text is logged at the call site, never returned to clients.
    pub fn public(&self) -> (&'static str, String) {
        match self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::Database(_) => ("DATABASE_ERROR", "A database error occurred".to_string()),
            AppError::Provider(e) => match e {
                ProviderError::Authentication(_) => (
                    "PROVIDER_AUTH_ERROR",
                    "The AI provider rejected the configured credentials. Update the API key in settings.".to_string(),
                ),
                ProviderError::RateLimited(_) => (
                    "PROVIDER_RATE_LIMITED",
                    "The AI provider is rate limiting requests. Try again shortly.".to_string(),
                ),
                ProviderError::MalformedResponse(_) => (
                    "PROVIDER_BAD_RESPONSE",
                    "The AI provider returned an unreadable response.".to_string(),
                ),
                _ => (
                    "PROVIDER_ERROR",
                    "The AI provider could not be reached.".to_string(),
                ),
            },
            AppError::ProviderUnavailable(msg) => ("PROVIDER_UNAVAILABLE", msg.clone()),
            AppError::Internal(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
            ),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider(e) => match e {
                ProviderError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Provider(e) => tracing::error!("Provider error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }

        let (code, message) = self.public();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (self.status_code(), body).into_response()
    }
}
