mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
}
