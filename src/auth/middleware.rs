use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::extract_token;
use super::token::Claims;
use crate::server::AppState;
use crate::types::User;

/// Extractor that requires a verified session token
pub struct RequireAuth(pub Claims);

/// Extractor that requires a session belonging to an existing admin user
pub struct RequireAdmin(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::NotAdmin => (StatusCode::UNAUTHORIZED, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "message": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"notebook-api\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = extract_and_verify_token(parts, state)?;
        Ok(RequireAuth(claims))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = extract_and_verify_token(parts, state)?;

        let user = state
            .store
            .get_user(&claims.user_id)
            .map_err(|e| {
                tracing::error!("Failed to load admin caller {}: {e}", claims.user_id);
                AuthError::InternalError
            })?
            .ok_or(AuthError::InvalidToken)?;

        if !user.role.is_admin() {
            tracing::warn!("Non-admin user {} attempted an admin action", user.id);
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(user))
    }
}

fn extract_and_verify_token(parts: &Parts, state: &Arc<AppState>) -> Result<Claims, AuthError> {
    let raw_token = extract_token(&parts.headers).ok_or(AuthError::MissingToken)?;
    state
        .tokens
        .verify(&raw_token)
        .ok_or(AuthError::InvalidToken)
}
