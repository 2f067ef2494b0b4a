//! Request-scoped context extracted from HTTP requests.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use timetable_id::{Uuid, UserId};

use crate::api::error::ApiError;
use crate::identity::USER_ID_HEADER;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// The caller named in `X-User-ID`, when present.
    pub requester: Option<UserId>,
}

impl RequestContext {
    /// The caller, or a 400 when the header was absent.
    pub fn require_requester(&self) -> Result<UserId, ApiError> {
        self.requester.ok_or_else(|| {
            ApiError::bad_request("missing_user_id", format!("{USER_ID_HEADER} header is required"))
                .with_request_id(self.request_id.clone())
        })
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let requester = match parts.headers.get(USER_ID_HEADER) {
            None => None,
            Some(value) => {
                let parsed = value
                    .to_str()
                    .ok()
                    .and_then(|raw| raw.parse::<UserId>().ok());
                match parsed {
                    Some(user_id) => Some(user_id),
                    None => {
                        return Err(ApiError::bad_request(
                            "invalid_user_id",
                            format!("{USER_ID_HEADER} must be a UUID"),
                        )
                        .with_request_id(request_id));
                    }
                }
            }
        };

        Ok(Self {
            request_id,
            requester,
        })
    }
}
