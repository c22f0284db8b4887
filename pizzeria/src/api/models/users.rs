//! API models for users.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::models::users::UserDBResponse, types::UserId};

/// The authenticated user attached to a request.
///
/// Resolved from a bearer token by the [`crate::auth::current_user`]
/// extractor. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
        }
    }
}

/// A user as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}
