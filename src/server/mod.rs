mod admin;
pub mod dto;
mod notebooks;
pub mod response;
mod router;
pub mod validation;

pub use admin::admin_router;
pub use notebooks::notebooks_router;
pub use router::{AppState, create_router};
