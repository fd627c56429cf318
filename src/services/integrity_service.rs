use crate::database::retry::with_retry;
use crate::error::{Error, Result};
use crate::models::integrity_log::{IntegrityEventType, IntegrityLogEntry};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct IntegrityService {
    pool: PgPool,
}

impl IntegrityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append-only ingestion of a monitor observation. The attempt must
    /// belong to the reporting student and still be open; events arriving
    /// after finalization are rejected so logs cannot be injected post hoc.
    ///
    /// The ownership and open-attempt guards live in the insert statement
    /// itself, like the `submitted_at IS NULL` guard on submit: the row
    /// only lands if the attempt is still open at insert time, so an event
    /// racing a concurrent finalization cannot slip in after it.
    pub async fn log_event(
        &self,
        attempt_id: Uuid,
        student_id: Uuid,
        event_type: IntegrityEventType,
        metadata: Option<JsonValue>,
    ) -> Result<IntegrityLogEntry> {
        let entry = sqlx::query_as::<_, IntegrityLogEntry>(
            r#"
            INSERT INTO integrity_logs (attempt_id, event_type, metadata)
            SELECT a.id, $2, $3
            FROM attempts a
            WHERE a.id = $1 AND a.student_id = $4 AND a.submitted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(event_type.as_str())
        .bind(metadata)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(entry) = entry {
            tracing::debug!(%attempt_id, event = %event_type, "integrity event logged");
            return Ok(entry);
        }

        // Nothing inserted; re-read only to word the refusal.
        let current: Option<(Uuid, Option<chrono::DateTime<chrono::Utc>>)> =
            sqlx::query_as(r#"SELECT student_id, submitted_at FROM attempts WHERE id = $1"#)
                .bind(attempt_id)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            Some((owner_id, submitted_at)) if owner_id == student_id && submitted_at.is_some() => {
                Err(Error::InvalidAttempt(
                    "Attempt has already been submitted".to_string(),
                ))
            }
            _ => Err(Error::InvalidAttempt("Invalid attempt ID".to_string())),
        }
    }

    /// TPO review feed for one attempt, newest first. Tenant scope is
    /// enforced via the owning exam's college.
    pub async fn logs_for_attempt(
        &self,
        attempt_id: Uuid,
        college_id: Uuid,
    ) -> Result<Vec<IntegrityLogEntry>> {
        let exam_college: Option<(Uuid,)> = with_retry("attempt_college", || {
            sqlx::query_as(
                r#"
                SELECT e.college_id
                FROM attempts a
                JOIN exams e ON e.id = a.exam_id
                WHERE a.id = $1
                "#,
            )
            .bind(attempt_id)
            .fetch_optional(&self.pool)
        })
        .await?;

        let Some((owning_college,)) = exam_college else {
            return Err(Error::NotFound("Attempt not found".to_string()));
        };
        if owning_college != college_id {
            return Err(Error::Forbidden(
                "Attempt belongs to another college".to_string(),
            ));
        }

        let rows = with_retry("attempt_logs", || {
            sqlx::query_as::<_, IntegrityLogEntry>(
                r#"SELECT * FROM integrity_logs WHERE attempt_id = $1 ORDER BY created_at DESC"#,
            )
            .bind(attempt_id)
            .fetch_all(&self.pool)
        })
        .await?;
        Ok(rows)
    }
}
