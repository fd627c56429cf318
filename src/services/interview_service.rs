use crate::database::retry::with_retry;
use crate::dto::interview_dto::CreateInterviewRequest;
use crate::error::{Error, Result};
use crate::models::interview_attempt::{InterviewAttempt, Turn, STATUS_IN_PROGRESS};
use crate::models::mock_interview::MockInterview;
use crate::services::eval_service::{EvalService, Evaluation};
use crate::utils::time::{check_window, now};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct InterviewStartOutcome {
    pub attempt: InterviewAttempt,
    pub resumed: bool,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        req: &CreateInterviewRequest,
        college_id: Uuid,
        created_by: Uuid,
    ) -> Result<MockInterview> {
        let interview = sqlx::query_as::<_, MockInterview>(
            r#"
            INSERT INTO mock_interviews
                (college_id, title, domain, topic, description, difficulty, start_time, end_time, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(college_id)
        .bind(&req.title)
        .bind(&req.domain)
        .bind(&req.topic)
        .bind(req.description.as_deref())
        .bind(&req.difficulty)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(interview)
    }

    /// Starts (or resumes) an interview attempt. The unique constraint on
    /// (mock_interview_id, student_id) closes the duplicate-start race; the
    /// conflict path fetches and returns the existing attempt whatever its
    /// status.
    pub async fn start(
        &self,
        mock_interview_id: Uuid,
        student_id: Uuid,
    ) -> Result<InterviewStartOutcome> {
        let interview = with_retry("get_interview", || {
            sqlx::query_as::<_, MockInterview>(r#"SELECT * FROM mock_interviews WHERE id = $1"#)
                .bind(mock_interview_id)
                .fetch_one(&self.pool)
        })
        .await?;

        check_window(interview.start_time, interview.end_time, now()).map_err(Error::OutOfWindow)?;

        let initial_history = json!([{
            "role": "system",
            "content": format!(
                "You are a strict but fair technical interviewer. Domain: {}. Topic: {}. \
                 Difficulty: {}. Ask one question at a time and keep responses conversational.",
                interview.domain, interview.topic, interview.difficulty
            ),
        }]);

        let inserted = with_retry("start_interview_attempt", || {
            sqlx::query_as::<_, InterviewAttempt>(
                r#"
                INSERT INTO mock_interview_attempts
                    (mock_interview_id, student_id, conversation_history, status)
                VALUES ($1, $2, $3, 'in_progress')
                ON CONFLICT (mock_interview_id, student_id) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(mock_interview_id)
            .bind(student_id)
            .bind(&initial_history)
            .fetch_optional(&self.pool)
        })
        .await?;

        if let Some(attempt) = inserted {
            tracing::info!(attempt_id = %attempt.id, %mock_interview_id, "interview attempt started");
            return Ok(InterviewStartOutcome {
                attempt,
                resumed: false,
            });
        }

        let existing = with_retry("resume_interview_attempt", || {
            sqlx::query_as::<_, InterviewAttempt>(
                r#"
                SELECT * FROM mock_interview_attempts
                WHERE mock_interview_id = $1 AND student_id = $2
                "#,
            )
            .bind(mock_interview_id)
            .bind(student_id)
            .fetch_one(&self.pool)
        })
        .await?;

        Ok(InterviewStartOutcome {
            attempt: existing,
            resumed: true,
        })
    }

    async fn get_owned(&self, attempt_id: Uuid, student_id: Uuid) -> Result<InterviewAttempt> {
        let attempt = sqlx::query_as::<_, InterviewAttempt>(
            r#"SELECT * FROM mock_interview_attempts WHERE id = $1"#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::InvalidAttempt("Invalid attempt ID".to_string()))?;

        if attempt.student_id != student_id {
            return Err(Error::InvalidAttempt("Invalid attempt ID".to_string()));
        }
        Ok(attempt)
    }

    /// Appends one conversation turn. Only open attempts accept turns;
    /// history is immutable once the attempt completes.
    pub async fn append_turn(
        &self,
        attempt_id: Uuid,
        student_id: Uuid,
        turn: Turn,
    ) -> Result<InterviewAttempt> {
        if turn.role != "user" && turn.role != "assistant" {
            return Err(Error::BadRequest(
                "Turn role must be 'user' or 'assistant'".to_string(),
            ));
        }

        let attempt = self.get_owned(attempt_id, student_id).await?;
        if attempt.status != STATUS_IN_PROGRESS {
            return Err(Error::InvalidAttempt(
                "Interview has already been completed".to_string(),
            ));
        }

        // jsonb array concatenation appends in place, so two interleaved
        // appends (a retried request racing the original) both land instead
        // of one overwriting the other.
        let turn_json = serde_json::to_value([turn])?;

        let updated = sqlx::query_as::<_, InterviewAttempt>(
            r#"
            UPDATE mock_interview_attempts
            SET conversation_history = conversation_history || $2, updated_at = now()
            WHERE id = $1 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(&turn_json)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::InvalidAttempt("Interview has already been completed".to_string())
        })?;

        Ok(updated)
    }

    /// Finalizes an interview attempt exactly once. The evaluation runs
    /// before the guarded update; if a concurrent submit wins, the stored
    /// score and feedback are returned unchanged.
    pub async fn submit(
        &self,
        attempt_id: Uuid,
        student_id: Uuid,
        eval: &EvalService,
    ) -> Result<InterviewAttempt> {
        let attempt = self.get_owned(attempt_id, student_id).await?;
        if attempt.status != STATUS_IN_PROGRESS {
            return Ok(attempt);
        }

        let Evaluation { score, feedback } = eval.evaluate(&attempt.conversation_history).await?;

        let updated = with_retry("submit_interview", || {
            sqlx::query_as::<_, InterviewAttempt>(
                r#"
                UPDATE mock_interview_attempts
                SET status = 'completed', score = $2, feedback = $3, updated_at = now()
                WHERE id = $1 AND status = 'in_progress'
                RETURNING *
                "#,
            )
            .bind(attempt_id)
            .bind(score)
            .bind(&feedback)
            .fetch_optional(&self.pool)
        })
        .await?;

        match updated {
            Some(row) => {
                tracing::info!(attempt_id = %row.id, score = row.score, "interview submitted");
                Ok(row)
            }
            None => self.get_owned(attempt_id, student_id).await,
        }
    }

    pub async fn list_for_college(&self, college_id: Uuid) -> Result<Vec<MockInterview>> {
        let rows = with_retry("list_interviews", || {
            sqlx::query_as::<_, MockInterview>(
                r#"SELECT * FROM mock_interviews WHERE college_id = $1 ORDER BY start_time DESC NULLS LAST"#,
            )
            .bind(college_id)
            .fetch_all(&self.pool)
        })
        .await?;
        Ok(rows)
    }
}
