use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::exam_dto::CreateExamRequest;
use crate::error::Error;
use crate::middleware::auth::Claims;
use crate::AppState;

fn require_college(claims: &Claims) -> crate::error::Result<Uuid> {
    claims
        .college_id
        .ok_or_else(|| Error::Forbidden("User not associated with a college".to_string()))
}

#[axum::debug_handler]
pub async fn create_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateExamRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let college_id = require_college(&claims)?;
    let exam = state
        .exam_service
        .create_exam(&req, college_id, claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(exam)).into_response())
}

#[axum::debug_handler]
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let college_id = require_college(&claims)?;
    let exams = state.exam_service.list_for_college(college_id).await?;
    Ok(Json(exams).into_response())
}

/// Student view: questions with correct answers stripped.
#[axum::debug_handler]
pub async fn exam_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let college_id = require_college(&claims)?;
    let questions = state
        .exam_service
        .public_questions(exam_id, college_id)
        .await?;
    Ok(Json(questions).into_response())
}
