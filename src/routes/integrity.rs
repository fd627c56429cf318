use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{LogIntegrityRequest, LogIntegrityResponse};
use crate::error::Error;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn log_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LogIntegrityRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state
        .integrity_service
        .log_event(req.attempt_id, claims.sub, req.event_type, req.metadata)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(LogIntegrityResponse {
            status: "logged".to_string(),
        }),
    )
        .into_response())
}

/// TPO/admin review: the full integrity log for one attempt.
#[axum::debug_handler]
pub async fn attempt_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let college_id = claims
        .college_id
        .ok_or_else(|| Error::Forbidden("User not associated with a college".to_string()))?;
    let logs = state
        .integrity_service
        .logs_for_attempt(attempt_id, college_id)
        .await?;
    Ok(Json(logs).into_response())
}
