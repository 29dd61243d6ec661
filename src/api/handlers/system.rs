//! System endpoints: health check and frequency catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::Frequency;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the service answers.
    pub status: String,
    /// Current server time (RFC 3339).
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Supported recurrence frequency.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FrequencyInfo {
    /// Value to send in rule requests.
    pub frequency: Frequency,
    /// Label for pickers.
    pub label: String,
}

/// `GET /config/frequencies`: List recurrence frequencies.
#[utoipa::path(
    get,
    path = "/config/frequencies",
    tag = "System",
    summary = "List recurrence frequencies",
    description = "Returns every frequency a recurrence rule may use, in display order.",
    responses(
        (status = 200, description = "Frequency catalog", body = Vec<FrequencyInfo>),
    )
)]
pub async fn frequencies_handler() -> impl IntoResponse {
    let frequencies: Vec<FrequencyInfo> = Frequency::ALL
        .iter()
        .map(|frequency| FrequencyInfo {
            frequency: *frequency,
            label: frequency.label().to_string(),
        })
        .collect();
    (StatusCode::OK, Json(frequencies))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/frequencies", get(frequencies_handler))
}
