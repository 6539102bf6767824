use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{UpdateUserRequest, UserPayload, UserResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::store::UserDeletion;

const DUPLICATE_EMAIL: &str = "User with this email already exists";

pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let update = req.into_update()?;

    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    if let Some(email) = &update.email {
        if !email.eq_ignore_ascii_case(&user.email) {
            let holder = state
                .store
                .get_user_by_email(email)
                .api_err("Failed to check email")?;
            if holder.is_some_and(|other| other.id != user.id) {
                return Err(ApiError::conflict(DUPLICATE_EMAIL));
            }
        }
    }

    if let Some(role) = update.role {
        if user.role.is_admin() && !role.is_admin() {
            tracing::warn!("Admin {} demoted admin {} to {role}", admin.id, user.id);
        }
    }

    let updated = match state.store.update_user(&user.id, &update, Utc::now()) {
        Ok(Some(updated)) => updated,
        Ok(None) => return Err(ApiError::not_found("User not found")),
        Err(Error::AlreadyExists) => return Err(ApiError::conflict(DUPLICATE_EMAIL)),
        Err(e) => {
            tracing::error!("Failed to update user {}: {e}", user.id);
            return Err(ApiError::internal("Failed to update user"));
        }
    };

    tracing::info!("Admin {} updated user {}", admin.id, updated.id);

    Ok::<_, ApiError>(Json(ApiResponse::with_message(
        "User updated successfully",
        UserPayload {
            user: UserResponse::from(updated),
        },
    )))
}

pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let outcome = state
        .store
        .delete_user_guarded(&id)
        .api_err("Failed to delete user")?;

    match outcome {
        UserDeletion::Deleted => {
            tracing::info!("Admin {} deleted user {id}", admin.id);
            Ok(Json(ApiResponse::message("User deleted successfully")))
        }
        UserDeletion::NotFound => Err(ApiError::not_found("User not found")),
        UserDeletion::LastAdmin => Err(ApiError::forbidden("Cannot delete the last admin")),
    }
}
