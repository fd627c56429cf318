use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exam {
    pub id: Uuid,
    pub college_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    /// Optional [start_time, end_time] window during which an attempt may
    /// be started. Either bound may be absent.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
