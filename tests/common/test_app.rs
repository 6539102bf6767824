use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use notebook_api::auth::{TOKEN_COOKIE, TokenService};
use notebook_api::server::{AppState, create_router};
use notebook_api::store::{ActivityLog, SqliteStore, Store};
use notebook_api::types::{Notebook, Role, User};

pub const TEST_SECRET: &str = "test-secret";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// An in-process server backed by a throwaway SQLite database.
pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub tokens: TokenService,
    router: Router,
}

impl TestApp {
    pub fn start() -> Self {
        Self::build(None)
    }

    /// Starts the app with a custom activity sink instead of the store's own log.
    pub fn with_activity_log(activity: Arc<dyn ActivityLog>) -> Self {
        Self::build(Some(activity))
    }

    fn build(activity: Option<Arc<dyn ActivityLog>>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("notebooks.db")).expect("open store"),
        );
        store.initialize().expect("initialize store");

        let tokens = TokenService::new(TEST_SECRET, 1).expect("token service");
        let activity = activity.unwrap_or_else(|| store.clone() as Arc<dyn ActivityLog>);
        let state = Arc::new(AppState::new(store.clone(), activity, tokens.clone()));

        Self {
            temp_dir,
            store,
            tokens,
            router: create_router(state),
        }
    }

    pub fn add_user(&self, id: &str, email: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: email.to_string(),
            role,
            is_verified: false,
            status: "active".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.create_user(&user).expect("create user");
        user
    }

    /// Inserts a notebook from its JSON form; omitted fields take their defaults.
    pub fn add_notebook(&self, mut document: Value) -> Notebook {
        if document.get("createdAt").is_none() {
            document["createdAt"] = serde_json::json!(Utc::now());
        }
        let notebook: Notebook = serde_json::from_value(document).expect("valid notebook");
        self.store.create_notebook(&notebook).expect("create notebook");
        notebook
    }

    pub fn notebook(&self, id: &str) -> Option<Notebook> {
        self.store.get_notebook(id).expect("get notebook")
    }

    pub fn token(&self, user_id: &str) -> String {
        self.tokens.issue(user_id).expect("issue token")
    }

    /// Sends a request with the token in the session cookie.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("theme=dark; {TOKEN_COOKIE}={token}"));
        }
        self.send(builder, body).await
    }

    /// Sends a request with the token in an `Authorization: Bearer` header.
    pub async fn request_with_bearer(&self, method: Method, uri: &str, token: &str) -> TestResponse {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        self.send(builder, None).await
    }

    /// Sends a cookie-authenticated request with a raw body and an optional content type.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, format!("{TOKEN_COOKIE}={token}"));
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("build request");
        self.dispatch(request).await
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Option<Value>) -> TestResponse {
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
