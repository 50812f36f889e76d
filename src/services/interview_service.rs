use crate::dto::interview_dto::ScoreInterviewPayload;
use crate::error::{Error, Result};
use crate::models::interview::{Interview, InterviewResult, InterviewStatus};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Interview> {
        let interview = sqlx::query_as::<_, Interview>(
            r#"
            SELECT id, application_id, room_id, scheduled_at, status, result,
                   technical_score, communication_score, problem_solving_score,
                   culture_fit_score, overall_score, interviewer_notes,
                   notification_sent, created_at, updated_at
            FROM interviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        interview.ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))
    }

    pub async fn list(
        &self,
        status: Option<&str>,
        result: Option<&str>,
    ) -> Result<Vec<Interview>> {
        if let Some(raw) = status {
            raw.parse::<InterviewStatus>().map_err(Error::BadRequest)?;
        }
        if let Some(raw) = result {
            raw.parse::<InterviewResult>().map_err(Error::BadRequest)?;
        }

        let interviews = sqlx::query_as::<_, Interview>(
            r#"
            SELECT id, application_id, room_id, scheduled_at, status, result,
                   technical_score, communication_score, problem_solving_score,
                   culture_fit_score, overall_score, interviewer_notes,
                   notification_sent, created_at, updated_at
            FROM interviews
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR result = $2)
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(status)
        .bind(result)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    /// Records the evaluation in one atomic update: all five scores, the
    /// notes, a definite result and the completed status together, guarded
    /// on the interview still being scheduled. A pending result or a missing
    /// field mutates nothing.
    pub async fn score(&self, id: Uuid, payload: &ScoreInterviewPayload) -> Result<Interview> {
        if payload.result == InterviewResult::Pending {
            return Err(Error::IncompleteEvaluation(
                "a definite result (passed or failed) is required".to_string(),
            ));
        }
        let scores = payload.evaluation().map_err(Error::IncompleteEvaluation)?;

        let updated = sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET technical_score = $1,
                communication_score = $2,
                problem_solving_score = $3,
                culture_fit_score = $4,
                overall_score = $5,
                interviewer_notes = $6,
                result = $7,
                status = 'completed',
                updated_at = NOW()
            WHERE id = $8 AND status = 'scheduled'
            RETURNING id, application_id, room_id, scheduled_at, status, result,
                      technical_score, communication_score, problem_solving_score,
                      culture_fit_score, overall_score, interviewer_notes,
                      notification_sent, created_at, updated_at
            "#,
        )
        .bind(scores.technical)
        .bind(scores.communication)
        .bind(scores.problem_solving)
        .bind(scores.culture_fit)
        .bind(scores.overall)
        .bind(payload.interviewer_notes.as_deref())
        .bind(payload.result.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(interview) => Ok(interview),
            None => {
                let exists = sqlx::query("SELECT id FROM interviews WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                if exists.is_some() {
                    // Re-scoring goes through an administrative override,
                    // which lives outside this subsystem.
                    Err(Error::BadRequest(
                        "Interview is already completed and cannot be re-scored".to_string(),
                    ))
                } else {
                    Err(Error::NotFound(format!("Interview {} not found", id)))
                }
            }
        }
    }
}
