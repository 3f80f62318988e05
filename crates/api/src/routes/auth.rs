//! Credential routes for the tenant resolved from the `Host` header.
//!
//! Login is public; adding, changing and deleting credentials require the
//! admin API key.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::models::{LoginAttempt, LoginResult, NewCredential};
use domain::services::AuthDriver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::TenantContext;
use crate::middleware::metrics::record_login_check;
use crate::services::{select_driver, DriverContext};

fn driver(state: &AppState, tenant: &TenantContext, headers: &HeaderMap) -> Arc<dyn AuthDriver> {
    select_driver(
        &state.config.auth,
        DriverContext {
            pool: &state.pool,
            prefix: &tenant.tenant.table_prefix,
            force_password_update: tenant.settings.force_password_update(),
            headers,
        },
    )
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCreated {
    pub login: String,
    pub domain: String,
}

/// POST /api/v1/auth/credentials
pub async fn add_credential(
    State(state): State<AppState>,
    tenant: TenantContext,
    headers: HeaderMap,
    Json(request): Json<NewCredential>,
) -> Result<(StatusCode, Json<CredentialCreated>), ApiError> {
    request.validate()?;

    driver(&state, &tenant, &headers)
        .add(&request.login, &request.password, &request.domain)
        .await?;

    info!(
        prefix = %tenant.tenant.table_prefix,
        login = %request.login,
        "Credential added"
    );

    Ok((
        StatusCode::CREATED,
        Json(CredentialCreated {
            login: request.login,
            domain: request.domain,
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Responds 401 with `authenticated: false` for unknown users and wrong
/// passwords alike.
pub async fn login(
    State(state): State<AppState>,
    tenant: TenantContext,
    headers: HeaderMap,
    Json(request): Json<LoginAttempt>,
) -> Result<(StatusCode, Json<LoginResult>), ApiError> {
    request.validate()?;

    let driver = driver(&state, &tenant, &headers);
    let authenticated = driver.check_password(&request.login, &request.password).await?;
    record_login_check(driver.kind().to_string(), authenticated);

    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    Ok((
        status,
        Json(LoginResult {
            login: request.login,
            authenticated,
        }),
    ))
}

/// PUT /api/v1/auth/credentials/:login/password
pub async fn change_password(
    State(state): State<AppState>,
    tenant: TenantContext,
    headers: HeaderMap,
    Path(login): Path<String>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    driver(&state, &tenant, &headers)
        .change_password(&login, &request.password)
        .await?;

    info!(prefix = %tenant.tenant.table_prefix, login = %login, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/auth/credentials/:login
pub async fn delete_credential(
    State(state): State<AppState>,
    tenant: TenantContext,
    headers: HeaderMap,
    Path(login): Path<String>,
) -> Result<StatusCode, ApiError> {
    driver(&state, &tenant, &headers).delete(&login).await?;

    info!(prefix = %tenant.tenant.table_prefix, login = %login, "Credential deleted");
    Ok(StatusCode::NO_CONTENT)
}
