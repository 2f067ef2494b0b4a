//! Health check endpoints.
//!
//! These endpoints are used by load balancers and orchestration systems
//! to determine if the service is healthy and ready to receive traffic.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "timetable";

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status: "ok" or "degraded".
    pub status: String,
    pub service: String,
    pub version: String,
    /// Current timestamp (RFC 3339).
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<ComponentStatus>,
}

/// Individual component status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentStatus {
    /// Status: "ok" or "unavailable".
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Create health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}

fn response(status: &str, database: Option<ComponentStatus>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        database,
    }
}

/// Liveness: the process is up. Dependencies are not checked.
async fn healthz() -> impl IntoResponse {
    Json(response("ok", None))
}

/// Readiness: storage answers. Returns 503 otherwise.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.service().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(response(
                "ok",
                Some(ComponentStatus {
                    status: "ok".to_string(),
                    message: None,
                }),
            )),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(response(
                "degraded",
                Some(ComponentStatus {
                    status: "unavailable".to_string(),
                    message: Some(e.to_string()),
                }),
            )),
        ),
    }
}
