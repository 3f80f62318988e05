//! Category relation routes.
//!
//! All routes work on the tenant resolved from the `Host` header. Adding and
//! deleting relations also requires the admin API key.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CategoryCounts, CategoryFaqMatrix, CategoryRef, CategoryRelation, RecordMailInfo,
};
use persistence::repositories::CategoryRelationRepository;
use serde::{Deserialize, Serialize};
use shared::validation::validate_language_code;
use std::collections::BTreeMap;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::TenantContext;

fn repository(state: &AppState, tenant: &TenantContext) -> CategoryRelationRepository {
    CategoryRelationRepository::new(state.pool.clone(), tenant.tenant.table_prefix.clone())
}

#[derive(Debug, Deserialize)]
pub struct CountsQuery {
    /// Only count records visible to this group.
    pub group: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LanguageQuery {
    #[validate(custom(function = "validate_language_code"))]
    pub lang: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRelationsQuery {
    #[validate(custom(function = "validate_language_code"))]
    pub lang: String,
    #[serde(default)]
    pub all_languages: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationRequest {
    #[validate(custom(function = "validate_language_code"))]
    pub category_lang: String,
    pub record_id: i64,
    #[validate(custom(function = "validate_language_code"))]
    pub record_lang: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRelationsResponse {
    pub category_id: i64,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationResponse {
    pub relation: CategoryRelation,
    pub created: bool,
}

/// GET /api/v1/categories/matrix
///
/// Category id to record ids, ordered by category then record.
pub async fn category_matrix(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<CategoryFaqMatrix>, ApiError> {
    let matrix = repository(&state, &tenant).category_faq_matrix().await?;
    Ok(Json(matrix))
}

/// GET /api/v1/categories/counts?group=
pub async fn category_counts(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<CountsQuery>,
) -> Result<Json<CategoryCounts>, ApiError> {
    let counts = repository(&state, &tenant)
        .faq_count_per_category(query.group)
        .await?;
    Ok(Json(counts))
}

/// GET /api/v1/faqs/:id/categories?lang=
pub async fn record_categories(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(record_id): Path<i64>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<BTreeMap<i64, CategoryRef>>, ApiError> {
    query.validate()?;
    let categories = repository(&state, &tenant)
        .categories_for_record(record_id, &query.lang)
        .await?;
    Ok(Json(categories))
}

/// GET /api/v1/faqs/:id/mail-info?lang=
pub async fn record_mail_info(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(record_id): Path<i64>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<RecordMailInfo>, ApiError> {
    query.validate()?;
    repository(&state, &tenant)
        .record_mail_info(record_id, &query.lang)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("FAQ {} not found in language '{}'", record_id, query.lang))
        })
}

/// DELETE /api/v1/categories/:id/relations?lang=&allLanguages=
pub async fn delete_relations(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(category_id): Path<i64>,
    Query(query): Query<DeleteRelationsQuery>,
) -> Result<Json<DeleteRelationsResponse>, ApiError> {
    query.validate()?;
    let deleted = repository(&state, &tenant)
        .delete_relations(category_id, &query.lang, query.all_languages)
        .await?;

    info!(
        prefix = %tenant.tenant.table_prefix,
        category_id = category_id,
        lang = %query.lang,
        all_languages = query.all_languages,
        deleted = deleted,
        "Category relations deleted"
    );

    Ok(Json(DeleteRelationsResponse {
        category_id,
        deleted,
    }))
}

/// POST /api/v1/categories/:id/relations
///
/// 201 when the relation was added, 200 when it already existed.
pub async fn add_relation(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(category_id): Path<i64>,
    Json(request): Json<AddRelationRequest>,
) -> Result<(StatusCode, Json<AddRelationResponse>), ApiError> {
    request.validate()?;
    let relation = CategoryRelation {
        category_id,
        category_lang: request.category_lang,
        record_id: request.record_id,
        record_lang: request.record_lang,
    };

    let created = repository(&state, &tenant).add_relation(&relation).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(AddRelationResponse { relation, created })))
}
