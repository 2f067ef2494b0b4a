//! Admin endpoints for timetable edits.
//!
//! The caller is named in `X-User-ID`. Authorization is decided by the
//! service after an identity lookup, not here.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use timetable_events::parse_wire_time;
use timetable_id::ClassId;

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::service::OverrideRequest;
use crate::state::AppState;

/// Admin routes.
///
/// /admin/timetable/...
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/timetable/today", post(update_today))
        .route("/timetable/overrides", post(create_override))
}

/// Edit of today's timetable. Missing fields take their empty value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateTodayRequest {
    pub class_id: String,
    pub slot_index: i32,
    pub course_code: String,
    pub start_time: String,
    pub end_time: String,
    pub venue: String,
    pub status: String,
}

/// Edit of an explicit date's timetable.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOverrideRequest {
    pub date: NaiveDate,
    pub class_id: String,
    #[serde(default)]
    pub slot_index: i32,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub status: String,
}

struct RawFields<'a> {
    class_id: &'a str,
    slot_index: i32,
    course_code: String,
    start_time: &'a str,
    end_time: &'a str,
    venue: String,
    status: String,
}

impl RawFields<'_> {
    fn parse(self, request_id: &str) -> Result<OverrideRequest, ApiError> {
        let class_id: ClassId = self.class_id.parse().map_err(|_| {
            ApiError::bad_request("invalid_class_id", "class_id must be a UUID")
                .with_request_id(request_id)
        })?;
        let start_time = wire_time("start_time", self.start_time, request_id)?;
        let end_time = wire_time("end_time", self.end_time, request_id)?;

        Ok(OverrideRequest {
            class_id,
            slot_index: self.slot_index,
            course_code: self.course_code,
            start_time,
            end_time,
            venue: self.venue,
            status: self.status,
        })
    }
}

fn wire_time(field: &str, value: &str, request_id: &str) -> Result<Option<NaiveTime>, ApiError> {
    parse_wire_time(value).map_err(|_| {
        ApiError::bad_request("invalid_time", format!("{field} must be HH:MM"))
            .with_request_id(request_id)
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>, request_id: &str) -> Result<T, ApiError> {
    body.map(|Json(body)| body).map_err(|rejection| {
        ApiError::bad_request("invalid_body", rejection.body_text()).with_request_id(request_id)
    })
}

/// POST /admin/timetable/today
async fn update_today(
    ctx: RequestContext,
    State(state): State<AppState>,
    body: Result<Json<UpdateTodayRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let requester = ctx.require_requester()?;
    let UpdateTodayRequest {
        class_id,
        slot_index,
        course_code,
        start_time,
        end_time,
        venue,
        status,
    } = json_body(body, &ctx.request_id)?;

    let request = RawFields {
        class_id: &class_id,
        slot_index,
        course_code,
        start_time: &start_time,
        end_time: &end_time,
        venue,
        status,
    }
    .parse(&ctx.request_id)?;

    state
        .service()
        .update_today_override(requester, request)
        .await
        .map_err(|e| ApiError::from_service(e, &ctx.request_id))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/timetable/overrides
async fn create_override(
    ctx: RequestContext,
    State(state): State<AppState>,
    body: Result<Json<CreateOverrideRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let requester = ctx.require_requester()?;
    let CreateOverrideRequest {
        date,
        class_id,
        slot_index,
        course_code,
        start_time,
        end_time,
        venue,
        status,
    } = json_body(body, &ctx.request_id)?;

    let request = RawFields {
        class_id: &class_id,
        slot_index,
        course_code,
        start_time: &start_time,
        end_time: &end_time,
        venue,
        status,
    }
    .parse(&ctx.request_id)?;

    state
        .service()
        .create_daily_override(requester, date, request)
        .await
        .map_err(|e| ApiError::from_service(e, &ctx.request_id))?;

    Ok(StatusCode::NO_CONTENT)
}
