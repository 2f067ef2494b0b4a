//! Class timetable reads.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use timetable_events::TimetableSlotPayload;
use timetable_id::ClassId;

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::state::AppState;

/// /v1/classes/{class_id}
pub fn routes() -> Router<AppState> {
    Router::new().route("/timetable", get(get_timetable))
}

#[derive(Debug, Deserialize)]
pub struct TimetableQuery {
    /// Defaults to today in the service's civil calendar.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct TimetableResponse {
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub slots: Vec<TimetableSlotPayload>,
}

/// GET /v1/classes/{class_id}/timetable
async fn get_timetable(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    query: Result<Query<TimetableQuery>, QueryRejection>,
) -> Result<Json<TimetableResponse>, ApiError> {
    let class_id: ClassId = class_id.parse().map_err(|_| {
        ApiError::bad_request("invalid_class_id", "class_id must be a UUID")
            .with_request_id(ctx.request_id.clone())
    })?;
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request("invalid_query", rejection.body_text())
            .with_request_id(ctx.request_id.clone())
    })?;

    let service = state.service();
    let date = query.date.unwrap_or_else(|| service.today());
    let slots = service
        .resolve_timetable(class_id, date)
        .await
        .map_err(|e| ApiError::from_service(e, &ctx.request_id))?;

    Ok(Json(TimetableResponse {
        class_id,
        date,
        slots: slots.iter().map(|slot| slot.to_payload()).collect(),
    }))
}
