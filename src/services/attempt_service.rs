use crate::database::retry::with_retry;
use crate::error::{Error, Result};
use crate::models::attempt::Attempt;
use crate::models::exam::Exam;
use crate::models::question::Question;
use crate::services::grading_service::GradingService;
use crate::utils::time::{check_window, now};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub attempt: Attempt,
    pub resumed: bool,
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub attempt_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub submitted_at: DateTime<Utc>,
    /// False when this call observed an already-finalized attempt and
    /// returned the persisted score unchanged.
    pub newly_submitted: bool,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_exam(&self, exam_id: Uuid) -> Result<Exam> {
        let exam = with_retry("get_exam", || {
            sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
                .bind(exam_id)
                .fetch_one(&self.pool)
        })
        .await?;
        Ok(exam)
    }

    /// Starts (or resumes) an attempt. The partial unique index over
    /// (exam_id, student_id) WHERE submitted_at IS NULL makes this race-safe:
    /// concurrent calls hit the conflict path and fetch the single open row
    /// instead of creating a duplicate.
    pub async fn start(&self, exam_id: Uuid, student_id: Uuid) -> Result<StartOutcome> {
        let exam = self.get_exam(exam_id).await?;
        check_window(exam.start_time, exam.end_time, now()).map_err(Error::OutOfWindow)?;

        let inserted = with_retry("start_attempt", || {
            sqlx::query_as::<_, Attempt>(
                r#"
                INSERT INTO attempts (exam_id, student_id, score)
                VALUES ($1, $2, 0)
                ON CONFLICT (exam_id, student_id) WHERE submitted_at IS NULL
                DO NOTHING
                RETURNING *
                "#,
            )
            .bind(exam_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
        })
        .await?;

        if let Some(attempt) = inserted {
            tracing::info!(attempt_id = %attempt.id, %exam_id, %student_id, "attempt started");
            return Ok(StartOutcome {
                attempt,
                resumed: false,
            });
        }

        let existing = with_retry("resume_attempt", || {
            sqlx::query_as::<_, Attempt>(
                r#"
                SELECT * FROM attempts
                WHERE exam_id = $1 AND student_id = $2 AND submitted_at IS NULL
                "#,
            )
            .bind(exam_id)
            .bind(student_id)
            .fetch_one(&self.pool)
        })
        .await?;

        tracing::info!(attempt_id = %existing.id, %exam_id, %student_id, "attempt resumed");
        Ok(StartOutcome {
            attempt: existing,
            resumed: true,
        })
    }

    pub async fn get_owned_attempt(&self, attempt_id: Uuid, student_id: Uuid) -> Result<Attempt> {
        let attempt = with_retry("get_attempt", || {
            sqlx::query_as::<_, Attempt>(r#"SELECT * FROM attempts WHERE id = $1"#)
                .bind(attempt_id)
                .fetch_optional(&self.pool)
        })
        .await?
        .ok_or_else(|| Error::InvalidAttempt("Invalid attempt ID".to_string()))?;

        if attempt.student_id != student_id {
            return Err(Error::InvalidAttempt("Invalid attempt ID".to_string()));
        }
        Ok(attempt)
    }

    /// Finalizes an attempt exactly once. The effective write is guarded by
    /// `submitted_at IS NULL`; the losing side of a duplicate-submit race
    /// (timer expiry vs manual click, or a retried request) re-reads the row
    /// and returns the already-persisted score without re-grading.
    pub async fn submit(
        &self,
        attempt_id: Uuid,
        student_id: Uuid,
        answers: &HashMap<Uuid, String>,
        is_termination: bool,
        termination_reason: Option<String>,
    ) -> Result<SubmitOutcome> {
        let attempt = self.get_owned_attempt(attempt_id, student_id).await?;

        let questions = self.exam_questions(attempt.exam_id).await?;
        let total_questions = questions.len() as i32;

        if attempt.is_submitted() {
            return Ok(SubmitOutcome {
                attempt_id,
                score: attempt.score,
                total_questions,
                submitted_at: attempt.submitted_at.unwrap_or_else(now),
                newly_submitted: false,
            });
        }

        let score = GradingService::grade(&questions, answers);
        let answers_json = serde_json::to_value(answers)?;

        let updated = with_retry("submit_attempt", || {
            sqlx::query_as::<_, Attempt>(
                r#"
                UPDATE attempts
                SET submitted_at = now(),
                    score = $2,
                    answers = $3,
                    is_termination = $4,
                    termination_reason = $5
                WHERE id = $1 AND submitted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(attempt_id)
            .bind(score)
            .bind(&answers_json)
            .bind(is_termination)
            .bind(termination_reason.as_deref())
            .fetch_optional(&self.pool)
        })
        .await?;

        match updated {
            Some(row) => {
                if is_termination {
                    tracing::warn!(
                        attempt_id = %row.id,
                        score = row.score,
                        reason = ?row.termination_reason,
                        "attempt force-submitted"
                    );
                } else {
                    tracing::info!(attempt_id = %row.id, score = row.score, "attempt submitted");
                }
                Ok(SubmitOutcome {
                    attempt_id: row.id,
                    score: row.score,
                    total_questions,
                    submitted_at: row.submitted_at.unwrap_or_else(now),
                    newly_submitted: true,
                })
            }
            None => {
                // Lost the race: somebody else finalized first.
                let current = self.get_owned_attempt(attempt_id, student_id).await?;
                Ok(SubmitOutcome {
                    attempt_id,
                    score: current.score,
                    total_questions,
                    submitted_at: current.submitted_at.unwrap_or_else(now),
                    newly_submitted: false,
                })
            }
        }
    }

    pub async fn exam_questions(&self, exam_id: Uuid) -> Result<Vec<Question>> {
        let rows = with_retry("exam_questions", || {
            sqlx::query_as::<_, Question>(
                r#"SELECT * FROM questions WHERE exam_id = $1 ORDER BY created_at"#,
            )
            .bind(exam_id)
            .fetch_all(&self.pool)
        })
        .await?;
        Ok(rows)
    }

    /// Reporting surface: all attempts for one exam, tenant-scoped by the
    /// caller's college.
    pub async fn list_for_exam(&self, exam_id: Uuid, college_id: Uuid) -> Result<Vec<Attempt>> {
        let exam = self.get_exam(exam_id).await?;
        if exam.college_id != college_id {
            return Err(Error::Forbidden(
                "Exam belongs to another college".to_string(),
            ));
        }

        let rows = with_retry("list_attempts", || {
            sqlx::query_as::<_, Attempt>(
                r#"SELECT * FROM attempts WHERE exam_id = $1 ORDER BY created_at DESC"#,
            )
            .bind(exam_id)
            .fetch_all(&self.pool)
        })
        .await?;
        Ok(rows)
    }
}
