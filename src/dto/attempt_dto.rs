use crate::models::integrity_log::IntegrityEventType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartAttemptRequest {
    pub exam_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    /// Authoritative start timestamp; clients derive remaining time from
    /// this, never from local state.
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    pub attempt_id: Uuid,
    /// Question id -> selected option. Answers are client-local until
    /// submission; the full map travels with this call.
    #[serde(default)]
    pub answers: HashMap<Uuid, String>,
    #[serde(default)]
    pub is_termination: bool,
    pub termination_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAttemptResponse {
    pub attempt_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogIntegrityRequest {
    pub attempt_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: IntegrityEventType,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogIntegrityResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Uuid,
    pub score: i32,
    pub is_termination: bool,
    pub termination_reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}
