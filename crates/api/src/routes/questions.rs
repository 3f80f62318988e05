//! Question notification routes.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::TenantContext;
use crate::middleware::metrics::record_notification;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnsweredRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "User name must be 1-100 characters"))]
    pub user_name: String,

    #[validate(url(message = "Answer URL must be an absolute URL"))]
    pub answer_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub delivered: bool,
    pub recipient: String,
}

/// POST /api/v1/questions/answered
///
/// Tells the person who asked a question where its answer lives.
pub async fn question_answered(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<QuestionAnsweredRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    request.validate()?;

    let outcome = state
        .notifier
        .notify_question_answered(
            &tenant.settings,
            &request.email,
            &request.user_name,
            &request.answer_url,
        )
        .await;
    record_notification(outcome.is_ok());
    outcome?;

    Ok(Json(NotificationResponse {
        delivered: true,
        recipient: request.email,
    }))
}
