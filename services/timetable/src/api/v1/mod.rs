//! API v1 routes.

mod classes;

use axum::Router;

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/classes/{class_id}", classes::routes())
}
