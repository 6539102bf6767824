use std::sync::LazyLock;

use regex::Regex;

use crate::server::response::ApiError;
use crate::types::Role;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub fn validate_role(role: &str) -> Result<Role, ApiError> {
    Role::parse(role).ok_or_else(|| {
        let allowed: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
        ApiError::bad_request(format!(
            "Invalid role '{role}'. Must be one of: {}",
            allowed.join(", ")
        ))
    })
}

/// Trims and lower-cases an email address, rejecting malformed ones.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let normalized = email.trim().to_lowercase();
    if !EMAIL_PATTERN.is_match(&normalized) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(normalized)
}
