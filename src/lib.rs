//! # notebook-api
//!
//! HTTP backend for notebook documents and admin-managed users, usable both as
//! a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! notebook-api = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notebook_api::auth::TokenService;
//! use notebook_api::server::{AppState, create_router};
//! use notebook_api::store::{SqliteStore, Store};
//!
//! let store = Arc::new(SqliteStore::new("./data/notebooks.db").unwrap());
//! store.initialize().unwrap();
//!
//! let tokens = TokenService::new("change-me", 24).unwrap();
//! let state = Arc::new(AppState::new(store.clone(), store, tokens));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `notebook-api` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod notebook;
pub mod server;
pub mod store;
pub mod types;
