//! Authenticated identity extractor.
//!
//! Authentication itself lives outside this service: the upstream auth
//! layer validates credentials and injects `x-user-id` and `x-user-role`
//! headers on every request. This extractor only materializes that contract
//! as a typed value; there is no anonymous access to any route.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Role, UserId};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    /// Fails with 403 unless the identity carries the admin role.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// True for admins and for the user themselves; used by read routes
    /// that owners and administrators share.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.role == Role::Admin || self.user_id == owner
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("missing or invalid {USER_ID_HEADER} header"))
            })?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("missing or invalid {USER_ROLE_HEADER} header"))
            })?;

        Ok(Identity { user_id, role })
    }
}
