use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewAttempt {
    pub id: Uuid,
    pub mock_interview_id: Uuid,
    pub student_id: Uuid,
    /// Ordered turn records: [{"role": "...", "content": "..."}, ..].
    pub conversation_history: JsonValue,
    pub status: String,
    pub score: i32,
    pub feedback: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}
