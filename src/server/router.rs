use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::notebooks::notebooks_router;
use crate::auth::TokenService;
use crate::store::{ActivityLog, Store};

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Best-effort sink for notebook activity.
    pub activity: Arc<dyn ActivityLog>,
    pub tokens: TokenService,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, activity: Arc<dyn ActivityLog>, tokens: TokenService) -> Self {
        Self {
            store,
            activity,
            tokens,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(notebooks_router())
        .nest("/admin", admin_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
