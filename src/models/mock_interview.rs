use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MockInterview {
    pub id: Uuid,
    pub college_id: Uuid,
    pub title: String,
    pub domain: String,
    pub topic: String,
    pub description: Option<String>,
    pub difficulty: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
