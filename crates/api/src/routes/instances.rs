//! Client instance provisioning routes.
//!
//! These routes require the admin API key.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::{ProvisionRequest, Tenant};
use domain::services::{Artifact, ProvisionError, ProvisionFailure, ProvisionStep, RegistryError};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_instance_provisioned;

/// Body returned when provisioning stops part way.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionFailureBody {
    pub error: &'static str,
    pub message: String,
    pub step: ProvisionStep,
    pub rolled_back: Vec<Artifact>,
    pub left_behind: Vec<Artifact>,
}

fn failure_status(error: &ProvisionError) -> (StatusCode, &'static str) {
    match error {
        ProvisionError::InUse(RegistryError::PrefixInUse(_))
        | ProvisionError::InUse(RegistryError::PrefixOverlaps { .. })
        | ProvisionError::InUse(RegistryError::HostnameInUse(_)) => {
            (StatusCode::CONFLICT, "conflict")
        }
        e if e.is_validation() => (StatusCode::BAD_REQUEST, "validation_error"),
        ProvisionError::DirectoryCreate { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "directory_unavailable")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "provisioning_failed"),
    }
}

/// Converts a failed run into its HTTP response.
pub fn failure_response(failure: ProvisionFailure) -> Response {
    let (status, error) = failure_status(&failure.error);
    let body = ProvisionFailureBody {
        error,
        message: failure.to_string(),
        step: failure.step,
        rolled_back: failure.rolled_back,
        left_behind: failure.left_behind,
    };
    (status, Json(body)).into_response()
}

/// POST /api/v1/admin/instances
///
/// Provisions a client instance from the master.
pub async fn create_instance(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let template = request.template_or(&state.config.tenancy.default_template);

    let outcome = state
        .orchestrator
        .provision_client(
            &request.hostname,
            &request.table_prefix,
            template,
            &request.client_url,
        )
        .await;

    match outcome {
        Ok(result) => {
            record_instance_provisioned("created", "none".to_string());
            info!(
                tenant_id = %result.tenant_id,
                hostname = %result.hostname,
                "Instance created via admin API"
            );
            Ok((StatusCode::CREATED, Json(result)).into_response())
        }
        Err(failure) => {
            record_instance_provisioned("failed", failure.step.to_string());
            Ok(failure_response(failure))
        }
    }
}

/// GET /api/v1/admin/instances
///
/// Lists every registered tenant, master first.
pub async fn list_instances(State(state): State<AppState>) -> Result<Json<Vec<Tenant>>, ApiError> {
    let tenants = state
        .tenants
        .list()
        .await?
        .into_iter()
        .map(Tenant::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::Internal)?;
    Ok(Json(tenants))
}
