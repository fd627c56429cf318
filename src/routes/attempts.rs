use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{
    AttemptSummary, StartAttemptRequest, StartAttemptResponse, SubmitAttemptRequest,
    SubmitAttemptResponse,
};
use crate::error::Error;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartAttemptRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let outcome = state.attempt_service.start(req.exam_id, claims.sub).await?;
    Ok(Json(StartAttemptResponse {
        attempt_id: outcome.attempt.id,
        started_at: outcome.attempt.created_at,
        resumed: outcome.resumed,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitAttemptRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    if req.is_termination && req.termination_reason.is_none() {
        return Err(Error::BadRequest(
            "termination_reason is required for a terminated submission".to_string(),
        ));
    }

    let outcome = state
        .attempt_service
        .submit(
            req.attempt_id,
            claims.sub,
            &req.answers,
            req.is_termination,
            req.termination_reason,
        )
        .await?;

    Ok(Json(SubmitAttemptResponse {
        attempt_id: outcome.attempt_id,
        score: outcome.score,
        total_questions: outcome.total_questions,
        submitted_at: outcome.submitted_at,
    })
    .into_response())
}

/// TPO reporting surface: attempts for one exam within the caller's
/// college.
#[axum::debug_handler]
pub async fn list_exam_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let college_id = claims
        .college_id
        .ok_or_else(|| Error::Forbidden("User not associated with a college".to_string()))?;
    let attempts = state
        .attempt_service
        .list_for_exam(exam_id, college_id)
        .await?;
    let summaries: Vec<AttemptSummary> = attempts
        .into_iter()
        .map(|a| AttemptSummary {
            id: a.id,
            exam_id: a.exam_id,
            student_id: a.student_id,
            score: a.score,
            is_termination: a.is_termination,
            termination_reason: a.termination_reason,
            created_at: a.created_at,
            submitted_at: a.submitted_at,
        })
        .collect();
    Ok(Json(summaries).into_response())
}
