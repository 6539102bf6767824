use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::notebook::{apply_update, can_edit, can_view, is_owner, word_count};
use crate::server::AppState;
use crate::server::dto::NotebookPayload;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{Activity, Notebook};

const UPDATE_ACTION: &str = "notebook_updated";

pub async fn get_notebook(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let caller = claims.user_id.as_str();

    let notebook = state
        .store
        .get_notebook(&id)
        .api_err("Failed to get notebook")?
        .filter(|nb| can_view(caller, nb))
        .or_not_found("Notebook not found")?;

    let notebook = if is_owner(caller, &notebook) {
        notebook
    } else {
        state
            .store
            .increment_notebook_views(&notebook.notebook_id)
            .api_err("Failed to record notebook view")?
            .or_not_found("Notebook not found")?
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(NotebookPayload { notebook })))
}

pub async fn update_notebook(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> impl IntoResponse {
    let caller = claims.user_id.as_str();
    let Json(changes) = body?;

    let mut notebook = state
        .store
        .get_notebook(&id)
        .api_err("Failed to get notebook")?
        .filter(|nb| can_edit(caller, nb))
        .or_not_found("Notebook not found or no edit permission")?;

    apply_update(&mut notebook, &changes, Utc::now()).map_err(ApiError::bad_request)?;

    let notebook = state
        .store
        .update_notebook(&notebook)
        .api_err("Failed to save notebook")?
        .or_not_found("Notebook not found")?;

    record_update(&state, caller, &notebook);

    Ok::<_, ApiError>(Json(ApiResponse::with_message(
        "Notebook saved successfully",
        NotebookPayload { notebook },
    )))
}

pub async fn delete_notebook(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_notebook_owned(&id, &claims.user_id)
        .api_err("Failed to delete notebook")?;

    if !deleted {
        return Err(ApiError::not_found("Notebook not found or no permission"));
    }

    tracing::info!("User {} deleted notebook {id}", claims.user_id);

    Ok::<_, ApiError>(Json(ApiResponse::message("Notebook deleted successfully")))
}

/// Appends an activity record for a saved notebook. Failures are logged and dropped.
fn record_update(state: &AppState, user_id: &str, notebook: &Notebook) {
    let activity = Activity {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        notebook_id: notebook.notebook_id.clone(),
        action: UPDATE_ACTION.to_string(),
        details: json!({
            "title": notebook.title,
            "cellCount": notebook.cells.len(),
            "wordCount": word_count(&notebook.cells),
            "version": notebook.version,
        }),
        created_at: Utc::now(),
    };

    if let Err(e) = state.activity.record_activity(&activity) {
        tracing::warn!(
            "Failed to record activity for notebook {}: {e}",
            notebook.notebook_id
        );
    }
}
