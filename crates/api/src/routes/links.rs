//! Share links for a FAQ record.

use axum::{
    extract::{Path, Query},
    Json,
};
use domain::services::{share_links, ShareLinks, SharedRecord};
use serde::Deserialize;
use shared::validation::validate_language_code;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::TenantContext;

#[derive(Debug, Deserialize, Validate)]
pub struct LinksQuery {
    pub cat: i64,
    #[validate(custom(function = "validate_language_code"))]
    pub lang: String,
    #[serde(default)]
    pub question: String,
}

/// GET /api/v1/faqs/:id/links?cat=&lang=&question=
pub async fn faq_links(
    tenant: TenantContext,
    Path(faq_id): Path<i64>,
    Query(query): Query<LinksQuery>,
) -> Result<Json<ShareLinks>, ApiError> {
    query.validate()?;

    let base_url = tenant.settings.base_url();
    let record = SharedRecord {
        faq_id,
        category_id: query.cat,
        language: &query.lang,
        question: &query.question,
    };
    Ok(Json(share_links(&base_url, &record)))
}
