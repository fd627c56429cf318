use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInterviewRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub domain: String,
    #[validate(length(min = 1))]
    pub topic: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub difficulty: String,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartInterviewRequest {
    pub mock_interview_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInterviewResponse {
    pub attempt_id: Uuid,
    pub status: String,
    pub conversation_history: JsonValue,
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppendTurnRequest {
    pub attempt_id: Uuid,
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitInterviewRequest {
    pub attempt_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInterviewResponse {
    pub attempt_id: Uuid,
    pub status: String,
    pub score: i32,
    pub feedback: JsonValue,
}
