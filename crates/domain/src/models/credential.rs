//! Login credential models.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A row of a tenant's `user_login` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub login: String,
    pub pass_hash: String,
    pub domain: String,
}

/// Request body for adding a credential.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCredential {
    #[validate(length(min = 1, max = 128, message = "Login must be 1-128 characters"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Domain must be at most 255 characters"))]
    pub domain: String,
}

/// Login attempt.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttempt {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Outcome of a login check returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub login: String,
    pub authenticated: bool,
}
