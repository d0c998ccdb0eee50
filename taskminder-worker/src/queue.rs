/// Notification job queue
///
/// Jobs are rows in `notification_jobs`. Claiming moves a batch from
/// `pending` to `running` in one statement using `FOR UPDATE SKIP LOCKED`,
/// so several workers can poll the same table without handing out a job
/// twice.
///
/// # Polling Strategy
///
/// - Poll interval: `JOB_POLL_INTERVAL_SECS` (default 2s)
/// - Batch size: `JOB_BATCH_SIZE` (default 10)
/// - Ordering: FIFO (created_at ASC)
/// - Stale jobs: a job left `running` longer than `JOB_STALE_AFTER_SECS`
///   (default 600s) is returned to `pending` before each claim, so a worker
///   that died mid-delivery does not strand it. A delivery slower than that
///   may run twice.
///
/// # Example
///
/// ```no_run
/// use taskminder_worker::queue::JobQueue;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let queue = JobQueue::new(pool);
///
/// for job in queue.claim_jobs(None).await? {
///     queue.mark_succeeded(job.id, serde_json::json!({})).await?;
/// }
/// # Ok(())
/// # }
/// ```

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::time::Duration;
use taskminder_shared::models::notification_job::{JobStatus, NotificationJob};
use thiserror::Error;
use uuid::Uuid;

/// Job queue error
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Job is missing or not in `running`
    #[error("Running job not found: {0}")]
    JobNotFound(Uuid),
}

/// Job queue reader and writer
pub struct JobQueue {
    db: PgPool,

    /// Maximum jobs to claim in one batch
    batch_size: usize,

    /// How long a job may stay `running` before it is requeued
    stale_after: Duration,
}

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(600);

impl JobQueue {
    pub fn new(db: PgPool) -> Self {
        Self::with_batch_size(db, 10)
    }

    pub fn with_batch_size(db: PgPool, batch_size: usize) -> Self {
        JobQueue {
            db,
            batch_size,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Returns jobs stuck in `running` past the stale timeout to `pending`
    ///
    /// Returns how many jobs were requeued.
    pub async fn requeue_stale(&self) -> Result<u64, QueueError> {
        let outcome = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET
                status = $1,
                started_at = NULL
            WHERE status = $2
              AND started_at < NOW() - make_interval(secs => $3)
            "#,
        )
        .bind(JobStatus::Pending)
        .bind(JobStatus::Running)
        .bind(self.stale_after.as_secs_f64())
        .execute(&self.db)
        .await?;

        let requeued = outcome.rows_affected();
        if requeued > 0 {
            tracing::warn!(count = requeued, "Requeued stale notification jobs");
        }

        Ok(requeued)
    }

    /// Claims pending jobs, oldest first
    ///
    /// Stale running jobs are requeued first. `limit` defaults to the
    /// queue's batch size.
    pub async fn claim_jobs(&self, limit: Option<usize>) -> Result<Vec<NotificationJob>, QueueError> {
        self.requeue_stale().await?;

        let limit = limit.unwrap_or(self.batch_size) as i64;

        let jobs = sqlx::query_as::<_, NotificationJob>(
            r#"
            WITH pending_jobs AS (
                SELECT id
                FROM notification_jobs
                WHERE status = $1
                ORDER BY created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE notification_jobs
            SET
                status = $3,
                started_at = NOW()
            FROM pending_jobs
            WHERE notification_jobs.id = pending_jobs.id
            RETURNING
                notification_jobs.id,
                notification_jobs.user_id,
                notification_jobs.task_id,
                notification_jobs.status,
                notification_jobs.result,
                notification_jobs.error,
                notification_jobs.created_at,
                notification_jobs.started_at,
                notification_jobs.finished_at
            "#,
        )
        .bind(JobStatus::Pending)
        .bind(limit)
        .bind(JobStatus::Running)
        .fetch_all(&self.db)
        .await?;

        if !jobs.is_empty() {
            tracing::info!(count = jobs.len(), "Claimed notification jobs");
        }

        Ok(jobs)
    }

    /// Marks a running job as succeeded with its delivery result
    pub async fn mark_succeeded(&self, job_id: Uuid, result: JsonValue) -> Result<(), QueueError> {
        self.finish(job_id, JobStatus::Succeeded, Some(result), None).await?;

        tracing::info!(job_id = %job_id, "Notification job succeeded");
        Ok(())
    }

    /// Marks a running job as failed
    ///
    /// `result` carries partial per-channel outcomes when delivery was attempted.
    pub async fn mark_failed(
        &self,
        job_id: Uuid,
        error: &str,
        result: Option<JsonValue>,
    ) -> Result<(), QueueError> {
        self.finish(job_id, JobStatus::Failed, result, Some(error)).await?;

        tracing::warn!(job_id = %job_id, error = %error, "Notification job failed");
        Ok(())
    }

    async fn finish(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<JsonValue>,
        error: Option<&str>,
    ) -> Result<(), QueueError> {
        let outcome = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET
                status = $2,
                result = $3,
                error = $4,
                finished_at = NOW()
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(job_id)
        .bind(status)
        .bind(result)
        .bind(error)
        .bind(JobStatus::Running)
        .execute(&self.db)
        .await?;

        if outcome.rows_affected() == 0 {
            return Err(QueueError::JobNotFound(job_id));
        }

        Ok(())
    }
}
