mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::server::AppState;

pub fn notebooks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notebooks/{id}", get(handlers::get_notebook))
        .route("/notebooks/{id}", put(handlers::update_notebook))
        .route("/notebooks/{id}", delete(handlers::delete_notebook))
}
