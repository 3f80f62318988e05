//! Search engine meta tag and OpenSearch routes.

use axum::{
    extract::Query,
    http::header,
    response::IntoResponse,
    Json,
};
use domain::services::{opensearch, seo};
use serde::{Deserialize, Serialize};

use crate::extractors::TenantContext;

#[derive(Debug, Deserialize)]
pub struct RobotsQuery {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct RobotsResponse {
    pub action: String,
    pub robots: String,
}

/// GET /api/v1/seo/robots?action=
pub async fn meta_robots(
    tenant: TenantContext,
    Query(query): Query<RobotsQuery>,
) -> Json<RobotsResponse> {
    let robots = seo::meta_robots(&tenant.settings, &query.action).to_string();
    Json(RobotsResponse {
        action: query.action,
        robots,
    })
}

/// GET /opensearch.xml
pub async fn opensearch_descriptor(tenant: TenantContext) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, opensearch::CONTENT_TYPE)],
        opensearch::descriptor(&tenant.settings),
    )
}
