//! Admin authentication middleware.
//!
//! Instance provisioning and credential management are guarded by a single
//! admin API key. Only its SHA-256 digest is configured; the presented
//! `X-API-Key` is hashed and compared in constant time.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::crypto::{constant_time_str_eq, sha256_hex};

use crate::app::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects requests whose `X-API-Key` does not match the configured admin
/// key. With no key configured, every admin route is closed.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.security.admin_api_key_hash.as_str();
    if expected.is_empty() {
        tracing::warn!("Admin route called but no admin API key is configured");
        return forbidden_response("Admin access is disabled");
    }

    let api_key = match req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(key) if !key.is_empty() => key,
        _ => return unauthorized_response("Invalid or missing API key"),
    };

    if !is_admin_key(api_key, expected) {
        return unauthorized_response("Invalid or missing API key");
    }

    next.run(req).await
}

fn is_admin_key(presented: &str, expected_hash: &str) -> bool {
    constant_time_str_eq(&sha256_hex(presented), &expected_hash.to_ascii_lowercase())
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Helper to create forbidden response.
fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": message
        })),
    )
        .into_response()
}
