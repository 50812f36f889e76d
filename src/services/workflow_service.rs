use crate::error::{Error, Result};
use crate::models::notification_job::PayloadKind;
use crate::models::workflow::{apply_confirmation, ResultWorkflow, WorkflowStep};
use crate::services::queue_service::NotificationQueueService;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const WORKFLOW_COLUMNS: &str =
    "id, step, furthest_step, accepted_ids, rejected_ids, dispatched_at, created_at, updated_at";

/// An interview enters a snapshot only while nothing has gone out for it:
/// not yet notified and no job still queued or sent. This keeps a second
/// run empty even while the first run's deliveries are in flight.
pub fn snapshot_eligible(notification_sent: bool, has_active_job: bool) -> bool {
    !notification_sent && !has_active_job
}

#[derive(Clone)]
pub struct WorkflowService {
    pool: PgPool,
    queue: NotificationQueueService,
}

impl WorkflowService {
    pub fn new(pool: PgPool, queue: NotificationQueueService) -> Self {
        Self { pool, queue }
    }

    /// Opens a confirmation run over a frozen snapshot of the completed
    /// interviews: passed ones into the accepted set, failed ones into the
    /// rejected set. Interviews already notified, or already holding a
    /// queued or sent job, are left out so a re-run never re-notifies.
    pub async fn start(&self) -> Result<ResultWorkflow> {
        let accepted = self.eligible("passed").await?;
        let rejected = self.eligible("failed").await?;

        let workflow = sqlx::query_as::<_, ResultWorkflow>(&format!(
            r#"
            INSERT INTO result_workflows (accepted_ids, rejected_ids)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            WORKFLOW_COLUMNS
        ))
        .bind(serde_json::to_value(&accepted)?)
        .bind(serde_json::to_value(&rejected)?)
        .fetch_one(&self.pool)
        .await?;
        Ok(workflow)
    }

    async fn eligible(&self, result: &str) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.notification_sent,
                   EXISTS (
                       SELECT 1 FROM notification_jobs j
                       WHERE j.interview_id = i.id
                         AND j.state IN ('queued', 'sent')
                   ) AS has_active_job
            FROM interviews i
            WHERE i.status = 'completed' AND i.result = $1
            ORDER BY i.scheduled_at ASC
            "#,
        )
        .bind(result)
        .fetch_all(&self.pool)
        .await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let notification_sent: bool = row.try_get("notification_sent")?;
            let has_active_job: bool = row.try_get("has_active_job")?;
            if snapshot_eligible(notification_sent, has_active_job) {
                ids.push(row.try_get("id")?);
            }
        }
        Ok(ids)
    }

    pub async fn get(&self, id: Uuid) -> Result<ResultWorkflow> {
        let workflow = sqlx::query_as::<_, ResultWorkflow>(&format!(
            "SELECT {} FROM result_workflows WHERE id = $1",
            WORKFLOW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        workflow.ok_or_else(|| Error::NotFound(format!("Workflow {} not found", id)))
    }

    pub async fn confirm_step(
        &self,
        id: Uuid,
        step: WorkflowStep,
        confirmed: bool,
    ) -> Result<ResultWorkflow> {
        let workflow = self.get(id).await?;
        let current: WorkflowStep = workflow.step.parse().map_err(Error::Internal)?;
        let furthest: WorkflowStep = workflow.furthest_step.parse().map_err(Error::Internal)?;

        let next =
            apply_confirmation(current, furthest, step, confirmed).map_err(Error::BadRequest)?;
        if next == current {
            return Ok(workflow);
        }
        let furthest = if next.index() > furthest.index() {
            next
        } else {
            furthest
        };

        let updated = sqlx::query_as::<_, ResultWorkflow>(&format!(
            r#"
            UPDATE result_workflows
            SET step = $1, furthest_step = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            WORKFLOW_COLUMNS
        ))
        .bind(next.as_str())
        .bind(furthest.as_str())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    /// The irreversible step: one job per snapshotted interview, accepted
    /// set first, then the workflow is marked dispatched. Enqueue order is
    /// guaranteed; delivery order is the queue's business. Returns how many
    /// jobs were actually enqueued (idempotence may skip some).
    pub async fn finalize(&self, id: Uuid) -> Result<u64> {
        let workflow = self.get(id).await?;
        let current: WorkflowStep = workflow.step.parse().map_err(Error::Internal)?;

        match current {
            WorkflowStep::FinalConfirm => {}
            WorkflowStep::Dispatched => {
                return Err(Error::BadRequest(
                    "Workflow has already been dispatched".to_string(),
                ))
            }
            _ => {
                return Err(Error::BadRequest(format!(
                    "Workflow is at {}; both review steps must be confirmed before dispatch",
                    current.as_str()
                )))
            }
        }

        let mut enqueued = 0u64;
        for interview_id in workflow.accepted()? {
            if self
                .queue
                .enqueue(interview_id, PayloadKind::Accepted)
                .await?
                .is_some()
            {
                enqueued += 1;
            }
        }
        for interview_id in workflow.rejected()? {
            if self
                .queue
                .enqueue(interview_id, PayloadKind::Rejected)
                .await?
                .is_some()
            {
                enqueued += 1;
            }
        }

        sqlx::query(
            r#"
            UPDATE result_workflows
            SET step = 'dispatched', furthest_step = 'dispatched',
                dispatched_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        tracing::info!(workflow = %id, enqueued, "Result notifications dispatched");
        Ok(enqueued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_interviews_enter_a_snapshot() {
        assert!(snapshot_eligible(false, false));
    }

    #[test]
    fn notified_or_in_flight_interviews_never_reenter_a_snapshot() {
        assert!(!snapshot_eligible(true, false));
        assert!(!snapshot_eligible(false, true));
        assert!(!snapshot_eligible(true, true));
    }
}
