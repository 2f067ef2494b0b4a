//! HTTP API handlers and routing.

mod admin;
pub mod error;
mod health;
pub mod request_context;
mod v1;

use axum::{
    http::{header, HeaderName, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")])
        .allow_origin(Any);

    Router::new()
        // Health endpoints
        .merge(health::routes())
        // Edits, requester named in X-User-ID
        .nest("/admin", admin::routes())
        // Reads
        .nest("/v1", v1::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
