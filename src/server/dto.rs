use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::response::ApiError;
use crate::server::validation::{normalize_email, validate_role};
use crate::types::{Notebook, Role, User, UserUpdate};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateUserRequest {
    /// Validates the request and normalizes its fields. Fails before anything
    /// touches the store.
    pub fn into_update(self) -> Result<UserUpdate, ApiError> {
        let role = self.role.as_deref().map(validate_role).transpose()?;
        let email = self.email.as_deref().map(normalize_email).transpose()?;

        Ok(UserUpdate {
            name: self.name.map(|n| n.trim().to_string()),
            email,
            role,
            is_verified: self.is_verified,
            status: self.status.map(|s| s.trim().to_string()),
        })
    }
}

/// A user as returned to callers. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct NotebookPayload {
    pub notebook: Notebook,
}
