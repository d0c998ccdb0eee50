/// Notification job model
///
/// A job is an on-demand request to remind a user about one of their tasks
/// right now, outside the periodic sweep. The API enqueues it, the worker
/// claims and executes it, and the API reports its status.
///
/// # State Machine
///
/// ```text
/// pending → running → succeeded
///                  → failed
/// ```
///
/// Claiming and completion live in the worker's job queue; this module only
/// enqueues and reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// On-demand reminder job
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationJob {
    pub id: Uuid,

    /// User who requested the job
    pub user_id: String,

    /// Task to remind about
    pub task_id: i64,

    pub status: JobStatus,

    /// Per-channel delivery outcomes, set once the job finishes
    pub result: Option<JsonValue>,

    /// Failure reason when `status` is `failed`
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl NotificationJob {
    /// Enqueues a pending job
    ///
    /// The caller must already have checked that `user_id` owns `task_id`.
    pub async fn enqueue(pool: &PgPool, user_id: &str, task_id: i64) -> Result<Self, sqlx::Error> {
        let job = sqlx::query_as::<_, NotificationJob>(
            r#"
            INSERT INTO notification_jobs (user_id, task_id)
            VALUES ($1, $2)
            RETURNING id, user_id, task_id, status, result, error,
                      created_at, started_at, finished_at
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    /// Finds a job by ID with owner isolation
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let job = sqlx::query_as::<_, NotificationJob>(
            r#"
            SELECT id, user_id, task_id, status, result, error,
                   created_at, started_at, finished_at
            FROM notification_jobs
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(job)
    }

    /// What a status poll should show as the job's result
    ///
    /// The delivery result once finished, otherwise the error text if any.
    pub fn public_result(&self) -> Option<JsonValue> {
        match (&self.result, &self.error) {
            (Some(result), _) => Some(result.clone()),
            (None, Some(error)) => Some(JsonValue::String(error.clone())),
            (None, None) => None,
        }
    }
}
