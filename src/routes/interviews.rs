use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::dto::interview_dto::{
    AppendTurnRequest, CreateInterviewRequest, StartInterviewRequest, StartInterviewResponse,
    SubmitInterviewRequest, SubmitInterviewResponse,
};
use crate::error::Error;
use crate::middleware::auth::Claims;
use crate::models::interview_attempt::Turn;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateInterviewRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let college_id = claims
        .college_id
        .ok_or_else(|| Error::Forbidden("User not associated with a college".to_string()))?;
    let interview = state
        .interview_service
        .create(&req, college_id, claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(interview)).into_response())
}

#[axum::debug_handler]
pub async fn list_interviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let college_id = claims
        .college_id
        .ok_or_else(|| Error::Forbidden("User not associated with a college".to_string()))?;
    let interviews = state.interview_service.list_for_college(college_id).await?;
    Ok(Json(interviews).into_response())
}

#[axum::debug_handler]
pub async fn start_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartInterviewRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let outcome = state
        .interview_service
        .start(req.mock_interview_id, claims.sub)
        .await?;
    Ok(Json(StartInterviewResponse {
        attempt_id: outcome.attempt.id,
        status: outcome.attempt.status,
        conversation_history: outcome.attempt.conversation_history,
        resumed: outcome.resumed,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn append_turn(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AppendTurnRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let attempt = state
        .interview_service
        .append_turn(
            req.attempt_id,
            claims.sub,
            Turn {
                role: req.role,
                content: req.content,
            },
        )
        .await?;
    Ok(Json(json!({
        "attempt_id": attempt.id,
        "conversation_history": attempt.conversation_history,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn submit_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitInterviewRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let attempt = state
        .interview_service
        .submit(req.attempt_id, claims.sub, &state.eval_service)
        .await?;
    Ok(Json(SubmitInterviewResponse {
        attempt_id: attempt.id,
        status: attempt.status,
        score: attempt.score,
        feedback: attempt.feedback.unwrap_or_else(|| json!({})),
    })
    .into_response())
}
