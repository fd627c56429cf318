use crate::database::retry::with_retry;
use crate::dto::exam_dto::{CreateExamRequest, ExamSummary};
use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::models::question::{PublicQuestion, Question};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ExamService {
    pool: PgPool,
}

impl ExamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_exam(
        &self,
        req: &CreateExamRequest,
        college_id: Uuid,
        created_by: Uuid,
    ) -> Result<Exam> {
        if let (Some(start), Some(end)) = (req.start_time, req.end_time) {
            if end <= start {
                return Err(Error::BadRequest(
                    "end_time must be after start_time".to_string(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let exam = sqlx::query_as::<_, Exam>(
            r#"
            INSERT INTO exams (college_id, title, description, duration_minutes, start_time, end_time, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(college_id)
        .bind(&req.title)
        .bind(req.description.as_deref())
        .bind(req.duration_minutes)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        for q in &req.questions {
            if !q.options.contains(&q.correct_answer) {
                return Err(Error::BadRequest(format!(
                    "Correct answer is not among the options for question '{}'",
                    q.question
                )));
            }
            sqlx::query(
                r#"
                INSERT INTO questions (exam_id, question, options, correct_answer)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(exam.id)
            .bind(&q.question)
            .bind(serde_json::to_value(&q.options)?)
            .bind(&q.correct_answer)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(exam_id = %exam.id, %college_id, "exam created");
        Ok(exam)
    }

    pub async fn list_for_college(&self, college_id: Uuid) -> Result<Vec<ExamSummary>> {
        let rows: Vec<(Exam, i64)> = with_retry("list_exams", || async {
            let exams = sqlx::query_as::<_, Exam>(
                r#"SELECT * FROM exams WHERE college_id = $1 ORDER BY created_at DESC"#,
            )
            .bind(college_id)
            .fetch_all(&self.pool)
            .await?;

            let mut out = Vec::with_capacity(exams.len());
            for exam in exams {
                let (count,): (i64,) =
                    sqlx::query_as(r#"SELECT COUNT(*) FROM questions WHERE exam_id = $1"#)
                        .bind(exam.id)
                        .fetch_one(&self.pool)
                        .await?;
                out.push((exam, count));
            }
            Ok(out)
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|(exam, total_questions)| ExamSummary {
                id: exam.id,
                title: exam.title,
                description: exam.description,
                duration_minutes: exam.duration_minutes,
                start_time: exam.start_time,
                end_time: exam.end_time,
                total_questions,
            })
            .collect())
    }

    /// Student-facing question list with correct answers stripped.
    pub async fn public_questions(
        &self,
        exam_id: Uuid,
        college_id: Uuid,
    ) -> Result<Vec<PublicQuestion>> {
        let exam = with_retry("get_exam", || {
            sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
                .bind(exam_id)
                .fetch_one(&self.pool)
        })
        .await?;
        if exam.college_id != college_id {
            return Err(Error::Forbidden(
                "Exam belongs to another college".to_string(),
            ));
        }

        let questions = with_retry("exam_questions", || {
            sqlx::query_as::<_, Question>(
                r#"SELECT * FROM questions WHERE exam_id = $1 ORDER BY created_at"#,
            )
            .bind(exam_id)
            .fetch_all(&self.pool)
        })
        .await?;

        Ok(questions.into_iter().map(PublicQuestion::from).collect())
    }
}
