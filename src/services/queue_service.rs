use crate::error::{Error, Result};
use crate::models::notification_job::{JobState, NotificationJob, PayloadKind};
use crate::services::mail_service::MailTransport;
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueStatus {
    pub queued: i64,
    pub sent: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueDecision {
    Insert,
    AlreadyNotified,
    AlreadyActive,
    PendingResult,
}

/// Idempotence gate for new jobs: an already-notified interview, or one with
/// a job still queued or sent, is a no-op; a pending result is refused.
pub fn enqueue_decision(
    result: &str,
    notification_sent: bool,
    has_active_job: bool,
) -> EnqueueDecision {
    if notification_sent {
        return EnqueueDecision::AlreadyNotified;
    }
    if PayloadKind::from_result(result).is_none() {
        return EnqueueDecision::PendingResult;
    }
    if has_active_job {
        return EnqueueDecision::AlreadyActive;
    }
    EnqueueDecision::Insert
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Retry,
    Park,
}

/// A failed attempt stays in the queue with backoff until the budget is
/// spent, then the job parks as failed.
pub fn attempt_outcome(attempt_count: i32, max_attempts: i32) -> AttemptOutcome {
    if attempt_count >= max_attempts {
        AttemptOutcome::Park
    } else {
        AttemptOutcome::Retry
    }
}

/// Only failed jobs are retryable; they go back to the queue with a fresh
/// attempt budget.
pub fn retry_transition(state: JobState) -> Option<(JobState, i32)> {
    match state {
        JobState::Failed => Some((JobState::Queued, 0)),
        JobState::Queued | JobState::Sent => None,
    }
}

// The pre-insert check races with concurrent enqueues; the partial unique
// index on live jobs turns the loser into a no-op instead of a duplicate.
fn absorb_duplicate_job(err: sqlx::Error) -> Result<Option<NotificationJob>> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Ok(None),
        other => Err(other.into()),
    }
}

#[derive(Clone)]
pub struct NotificationQueueService {
    pool: PgPool,
    max_attempts: i32,
}

impl NotificationQueueService {
    pub fn new(pool: PgPool, max_attempts: i32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Durably records one delivery job and returns without waiting for it.
    ///
    /// No-op (`Ok(None)`) when the interview was already notified or already
    /// has a queued or sent job; enqueueing for a pending result is refused
    /// outright.
    pub async fn enqueue(
        &self,
        interview_id: Uuid,
        kind: PayloadKind,
    ) -> Result<Option<NotificationJob>> {
        let interview =
            sqlx::query("SELECT result, notification_sent FROM interviews WHERE id = $1")
                .bind(interview_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Interview {} not found", interview_id)))?;
        let result: String = interview.try_get("result")?;
        let notification_sent: bool = interview.try_get("notification_sent")?;

        let existing = sqlx::query(
            r#"SELECT id FROM notification_jobs
               WHERE interview_id = $1 AND state IN ('queued', 'sent')
               LIMIT 1"#,
        )
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await?;

        match enqueue_decision(&result, notification_sent, existing.is_some()) {
            EnqueueDecision::AlreadyNotified | EnqueueDecision::AlreadyActive => return Ok(None),
            EnqueueDecision::PendingResult => {
                return Err(Error::BadRequest(
                    "Interview result is still pending; there is nothing to notify".to_string(),
                ))
            }
            EnqueueDecision::Insert => {}
        }

        let inserted = sqlx::query_as::<_, NotificationJob>(
            r#"
            INSERT INTO notification_jobs (interview_id, payload_kind, max_attempts)
            VALUES ($1, $2, $3)
            RETURNING id, interview_id, payload_kind, attempt_count, max_attempts,
                      state, last_error, next_retry_at, created_at, updated_at
            "#,
        )
        .bind(interview_id)
        .bind(kind.as_str())
        .bind(self.max_attempts)
        .fetch_one(&self.pool)
        .await;
        match inserted {
            Ok(job) => Ok(Some(job)),
            Err(err) => absorb_duplicate_job(err),
        }
    }

    pub async fn status(&self) -> Result<QueueStatus> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) FILTER (WHERE state = 'queued') AS queued,
                   COUNT(*) FILTER (WHERE state = 'sent') AS sent,
                   COUNT(*) FILTER (WHERE state = 'failed') AS failed
            FROM notification_jobs
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(QueueStatus {
            queued: row.try_get("queued")?,
            sent: row.try_get("sent")?,
            failed: row.try_get("failed")?,
        })
    }

    /// Moves all and only the failed jobs back to the queue with a fresh
    /// attempt budget. A second call with nothing failed returns 0.
    pub async fn retry_failed(&self) -> Result<u64> {
        let Some((next_state, reset_attempts)) = retry_transition(JobState::Failed) else {
            return Ok(0);
        };
        let done = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET state = $1, attempt_count = $2, last_error = NULL,
                next_retry_at = NULL, updated_at = NOW()
            WHERE state = $3
            "#,
        )
        .bind(next_state.as_str())
        .bind(reset_attempts)
        .bind(JobState::Failed.as_str())
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    /// One worker iteration: claim the oldest due job, attempt delivery,
    /// record the outcome. Returns false when the queue is idle.
    ///
    /// A successful send marks the job sent and flips the interview's
    /// `notification_sent` flag in the same transaction; that flag has no
    /// other writer. A failed attempt keeps the job queued with exponential
    /// backoff until the attempt budget runs out, then parks it as failed.
    pub async fn run_once(&self, mailer: &impl MailTransport) -> Result<bool> {
        let claimed = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET attempt_count = attempt_count + 1, updated_at = NOW()
            WHERE id = (
                SELECT id FROM notification_jobs
                WHERE state = 'queued'
                  AND (next_retry_at IS NULL OR next_retry_at <= NOW())
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, interview_id, payload_kind, attempt_count, max_attempts
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        let Some(job) = claimed else { return Ok(false) };

        let job_id: Uuid = job.try_get("id")?;
        let interview_id: Uuid = job.try_get("interview_id")?;
        let payload_kind: String = job.try_get("payload_kind")?;
        let attempt_count: i32 = job.try_get("attempt_count")?;
        let max_attempts: i32 = job.try_get("max_attempts")?;

        let kind: PayloadKind = payload_kind.parse().map_err(Error::Internal)?;

        let recipient = sqlx::query(
            r#"
            SELECT a.candidate_name, a.email
            FROM interviews i
            JOIN applications a ON a.id = i.application_id
            WHERE i.id = $1
            "#,
        )
        .bind(interview_id)
        .fetch_one(&self.pool)
        .await?;
        let candidate_name: String = recipient.try_get("candidate_name")?;
        let email: String = recipient.try_get("email")?;

        let (subject, body) = render_email(kind, &candidate_name);

        match mailer.send(&email, &subject, &body).await {
            Ok(()) => {
                let mut tx = self.pool.begin().await?;
                sqlx::query(
                    r#"UPDATE notification_jobs
                       SET state = $1, last_error = NULL, updated_at = NOW()
                       WHERE id = $2"#,
                )
                .bind(JobState::Sent.as_str())
                .bind(job_id)
                .execute(&mut *tx)
                .await?;
                sqlx::query(
                    r#"UPDATE interviews
                       SET notification_sent = TRUE, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(interview_id)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
            }
            Err(err) => {
                tracing::warn!(
                    job = %job_id,
                    interview = %interview_id,
                    attempt = attempt_count,
                    error = %err,
                    "Notification delivery attempt failed"
                );
                match attempt_outcome(attempt_count, max_attempts) {
                    AttemptOutcome::Park => {
                        sqlx::query(
                            r#"UPDATE notification_jobs
                               SET state = 'failed', last_error = $1, updated_at = NOW()
                               WHERE id = $2"#,
                        )
                        .bind(err.to_string())
                        .bind(job_id)
                        .execute(&self.pool)
                        .await?;
                    }
                    AttemptOutcome::Retry => {
                        sqlx::query(
                            r#"UPDATE notification_jobs
                               SET last_error = $1,
                                   next_retry_at = NOW() + make_interval(secs => LEAST(3600, 30 * power(2::float, GREATEST(0, attempt_count - 1))::int)),
                                   updated_at = NOW()
                               WHERE id = $2"#,
                        )
                        .bind(err.to_string())
                        .bind(job_id)
                        .execute(&self.pool)
                        .await?;
                    }
                }
            }
        }

        Ok(true)
    }
}

pub fn render_email(kind: PayloadKind, candidate_name: &str) -> (String, String) {
    match kind {
        PayloadKind::Accepted => (
            "Your interview result".to_string(),
            format!(
                "Dear {},\n\nCongratulations! You passed the interview. \
                 We will contact you shortly with the next steps.\n",
                candidate_name
            ),
        ),
        PayloadKind::Rejected => (
            "Your interview result".to_string(),
            format!(
                "Dear {},\n\nThank you for taking the time to interview with us. \
                 Unfortunately we will not be moving forward with your application.\n",
                candidate_name
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_email_congratulates_by_name() {
        let (subject, body) = render_email(PayloadKind::Accepted, "Alice");
        assert_eq!(subject, "Your interview result");
        assert!(body.contains("Alice"));
        assert!(body.contains("Congratulations"));
    }

    #[test]
    fn rejected_email_declines_politely() {
        let (_, body) = render_email(PayloadKind::Rejected, "Bob");
        assert!(body.contains("Bob"));
        assert!(body.contains("not be moving forward"));
    }

    #[test]
    fn enqueue_is_a_noop_for_an_already_notified_interview() {
        assert_eq!(
            enqueue_decision("passed", true, false),
            EnqueueDecision::AlreadyNotified
        );
        assert_eq!(
            enqueue_decision("failed", true, true),
            EnqueueDecision::AlreadyNotified
        );
    }

    #[test]
    fn enqueue_is_a_noop_while_a_job_is_queued_or_sent() {
        assert_eq!(
            enqueue_decision("passed", false, true),
            EnqueueDecision::AlreadyActive
        );
    }

    #[test]
    fn enqueue_refuses_a_pending_result() {
        assert_eq!(
            enqueue_decision("pending", false, false),
            EnqueueDecision::PendingResult
        );
    }

    #[test]
    fn enqueue_inserts_for_a_definite_unnotified_result() {
        assert_eq!(
            enqueue_decision("passed", false, false),
            EnqueueDecision::Insert
        );
        assert_eq!(
            enqueue_decision("failed", false, false),
            EnqueueDecision::Insert
        );
    }

    #[test]
    fn attempts_below_the_budget_retry_then_park() {
        assert_eq!(attempt_outcome(1, 5), AttemptOutcome::Retry);
        assert_eq!(attempt_outcome(4, 5), AttemptOutcome::Retry);
        assert_eq!(attempt_outcome(5, 5), AttemptOutcome::Park);
        assert_eq!(attempt_outcome(6, 5), AttemptOutcome::Park);
    }

    #[test]
    fn only_failed_jobs_are_retryable_and_reset_their_attempts() {
        assert_eq!(
            retry_transition(JobState::Failed),
            Some((JobState::Queued, 0))
        );
        assert_eq!(retry_transition(JobState::Queued), None);
        assert_eq!(retry_transition(JobState::Sent), None);
    }

    #[derive(Debug)]
    struct DuplicateKeyError;

    impl std::fmt::Display for DuplicateKeyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKeyError {}

    impl sqlx::error::DatabaseError for DuplicateKeyError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn a_racing_duplicate_insert_collapses_to_a_noop() {
        let err = sqlx::Error::Database(Box::new(DuplicateKeyError));
        assert!(matches!(absorb_duplicate_job(err), Ok(None)));
    }

    #[test]
    fn non_duplicate_insert_errors_still_propagate() {
        assert!(absorb_duplicate_job(sqlx::Error::RowNotFound).is_err());
    }
}
