//! RFC 7807 problem documents for API errors.

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::service::{ErrorKind, ServiceError};

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub code: String,
    pub request_id: String,
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            r#type: format!("/problems/{code}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
            code,
            request_id: "unknown".to_string(),
        }
    }

    fn set_request_id(&mut self, request_id: impl Into<String>) {
        let request_id = request_id.into();
        self.request_id = request_id.clone();
        if self.instance.is_none() {
            self.instance = Some(request_id);
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    fn with_status(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.problem.set_request_id(request_id);
        self
    }

    /// Map a service failure onto its HTTP status.
    ///
    /// Internal failures are logged here and their detail is withheld.
    pub fn from_service(err: ServiceError, request_id: &str) -> Self {
        let api_error = match err.kind() {
            ErrorKind::InvalidInput => Self::bad_request("invalid_input", err.to_string()),
            ErrorKind::Unauthorized => {
                Self::forbidden("forbidden", "Requester may not edit this timetable")
            }
            ErrorKind::NotFound => Self::not_found("requester_not_found", "Requester not found"),
            ErrorKind::Conflict => Self::conflict("conflict", err.to_string()),
            ErrorKind::Internal => {
                error!(error = %err, request_id = %request_id, "request failed");
                Self::internal("internal_error", "Internal error")
            }
        };
        api_error.with_request_id(request_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::identity::IdentityError;

    #[test]
    fn test_service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::invalid("slot_index must be positive"), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized, StatusCode::FORBIDDEN),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Conflict("key".to_string()), StatusCode::CONFLICT),
            (
                ServiceError::from(DbError::Query(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::from(IdentityError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from_service(err, "req-1").status, status);
        }
    }

    #[test]
    fn test_internal_detail_is_withheld() {
        let err = ApiError::from_service(
            ServiceError::from(DbError::Query(sqlx::Error::PoolTimedOut)),
            "req-1",
        );
        assert_eq!(err.problem.detail, "Internal error");
        assert_eq!(err.problem.request_id, "req-1");
        assert_eq!(err.problem.instance.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_problem_content_type() {
        let response = ApiError::bad_request("invalid_input", "bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
