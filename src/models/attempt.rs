use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// One student's engagement with one exam. `created_at` is authoritative
/// for time-window math; `submitted_at` is set exactly once, after which
/// `answers` and `score` are immutable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attempt {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Uuid,
    pub score: i32,
    /// Map of question id -> selected option, persisted at submit time.
    pub answers: Option<JsonValue>,
    pub is_termination: bool,
    pub termination_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}
