//! HTTP client for the identity service's `/me` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use timetable_id::{ClassId, UserId, Uuid};
use tracing::{debug, warn};

use super::{IdentityClient, IdentityError, IdentityRole, IdentityUser};

/// Header carrying the requester's user id.
pub const USER_ID_HEADER: &str = "X-User-ID";

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: MeUser,
    #[serde(default)]
    roles: Vec<MeRole>,
}

#[derive(Debug, Deserialize)]
struct MeUser {
    id: Uuid,
    #[allow(dead_code)]
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeRole {
    name: String,
    #[serde(default)]
    class_id: Option<Uuid>,
}

/// Identity client that calls `GET {base_url}/me`.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn get_me(&self, user_id: UserId) -> Result<IdentityUser, IdentityError> {
        if self.base_url.is_empty() {
            return Err(IdentityError::NotConfigured);
        }

        let response = self
            .client
            .get(format!("{}/me", self.base_url))
            .header(USER_ID_HEADER, user_id.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout
                } else {
                    IdentityError::Transport(e)
                }
            })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(IdentityError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(IdentityError::Unauthorized)
            }
            other => {
                warn!(status = other.as_u16(), user_id = %user_id, "Unexpected identity status");
                return Err(IdentityError::UnexpectedStatus(other.as_u16()));
            }
        }

        let body: MeResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        if body.user.id.is_nil() {
            return Err(IdentityError::InvalidResponse(
                "identity response missing id".to_string(),
            ));
        }

        let roles = body
            .roles
            .into_iter()
            .map(|role| IdentityRole {
                name: role.name,
                class_id: role.class_id.filter(|id| !id.is_nil()).map(ClassId::from_uuid),
            })
            .collect::<Vec<_>>();

        debug!(user_id = %user_id, role_count = roles.len(), "Identity resolved");

        Ok(IdentityUser {
            id: UserId::from_uuid(body.user.id),
            roles,
        })
    }
}
