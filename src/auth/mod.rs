mod helpers;
mod middleware;
mod password;
mod token;

pub use helpers::{TOKEN_COOKIE, extract_token};
pub use middleware::{AuthError, RequireAdmin, RequireAuth};
pub use password::hash_password;
pub use token::{Claims, TokenService};
