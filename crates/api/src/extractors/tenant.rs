//! Tenant resolution from the `Host` header.
//!
//! A request addressed to a registered, active client hostname is served by
//! that client's tables. Every other request, including those without a
//! `Host`, is served by the master.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use domain::models::{Tenant, TenantSettings};
use persistence::entities::TenantEntity;
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;

/// The tenant a request is addressed to, with its configuration loaded.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub settings: TenantSettings,
}

/// Lower-cased host without port, or `None` for an empty header.
pub fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

fn into_tenant(entity: TenantEntity) -> Result<Tenant, ApiError> {
    Tenant::try_from(entity).map_err(|e| ApiError::Internal(format!("Corrupt tenant row: {}", e)))
}

impl TenantContext {
    pub async fn resolve(state: &AppState, host: Option<&str>) -> Result<Self, ApiError> {
        let client = match host.and_then(normalize_host) {
            Some(host) => state.tenants.find_active_by_hostname(&host).await?,
            None => None,
        };

        let entity = match client {
            Some(entity) => entity,
            None => state.tenants.find_master().await?.ok_or_else(|| {
                ApiError::ServiceUnavailable("No master tenant is registered".to_string())
            })?,
        };

        let tenant = into_tenant(entity)?;
        let settings = state.config_store.load_settings(&tenant.table_prefix).await?;
        debug!(prefix = %tenant.table_prefix, hostname = %tenant.hostname, "Tenant resolved");

        Ok(Self { tenant, settings })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self::resolve(state, host.as_deref()).await
    }
}
