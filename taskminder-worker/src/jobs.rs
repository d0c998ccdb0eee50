/// On-demand notification job execution
///
/// A job reminds the owner about one task right now. Delivery goes through
/// every channel flagged on the task, or email alone when none is flagged.
/// The job succeeds when at least one channel sent the reminder.
///
/// Stored result:
///
/// ```json
/// {
///   "task_id": 12,
///   "channels": {
///     "email": { "status": "sent" },
///     "sms": { "status": "failed", "error": "Rejected by provider: No route" }
///   }
/// }
/// ```

use crate::dispatch::{DeliveryOutcome, Dispatcher};
use crate::queue::{JobQueue, QueueError};
use serde_json::{json, Map, Value as JsonValue};
use sqlx::PgPool;
use std::sync::Arc;
use taskminder_shared::models::notification_job::NotificationJob;
use taskminder_shared::models::task::{ReminderChannel, Task};
use taskminder_shared::models::user::User;

/// Why a job did not succeed
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub error: String,
    pub result: Option<JsonValue>,
}

impl JobFailure {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            result: None,
        }
    }
}

/// Channels a job delivers through
pub fn job_channels(task: &Task) -> Vec<ReminderChannel> {
    let channels = task.enabled_channels();
    if channels.is_empty() {
        vec![ReminderChannel::Email]
    } else {
        channels
    }
}

/// Folds per-channel outcomes into the job's result
pub fn summarize(
    task_id: i64,
    outcomes: &[(ReminderChannel, DeliveryOutcome)],
) -> Result<JsonValue, JobFailure> {
    let channels: Map<String, JsonValue> = outcomes
        .iter()
        .map(|(kind, outcome)| (kind.as_str().to_string(), outcome.to_json()))
        .collect();

    let result = json!({ "task_id": task_id, "channels": channels });

    if outcomes.iter().any(|(_, outcome)| outcome.is_sent()) {
        Ok(result)
    } else {
        Err(JobFailure {
            error: "Reminder was not delivered on any channel".to_string(),
            result: Some(result),
        })
    }
}

/// Executes claimed jobs and records their outcome
pub struct JobExecutor {
    db: PgPool,
    dispatcher: Arc<Dispatcher>,
}

impl JobExecutor {
    pub fn new(db: PgPool, dispatcher: Arc<Dispatcher>) -> Self {
        Self { db, dispatcher }
    }

    /// Delivers the job's reminder without touching the job row
    pub async fn deliver(&self, job: &NotificationJob) -> Result<JsonValue, JobFailure> {
        let task = Task::find_for_user(&self.db, &job.user_id, job.task_id)
            .await
            .map_err(|e| JobFailure::new(format!("Failed to load task: {}", e)))?
            .ok_or_else(|| JobFailure::new("Task not found"))?;

        let owner = User::find_by_id(&self.db, &job.user_id)
            .await
            .map_err(|e| JobFailure::new(format!("Failed to load user: {}", e)))?
            .ok_or_else(|| JobFailure::new("User not found"))?;

        let mut outcomes = Vec::new();
        for kind in job_channels(&task) {
            let outcome = self.dispatcher.deliver(kind, &task, Some(&owner)).await;
            outcomes.push((kind, outcome));
        }

        summarize(task.id, &outcomes)
    }

    /// Executes a claimed job and marks it finished
    pub async fn execute(&self, queue: &JobQueue, job: &NotificationJob) -> Result<(), QueueError> {
        tracing::debug!(job_id = %job.id, task_id = job.task_id, user_id = %job.user_id, "Executing notification job");

        match self.deliver(job).await {
            Ok(result) => queue.mark_succeeded(job.id, result).await,
            Err(failure) => queue.mark_failed(job.id, &failure.error, failure.result).await,
        }
    }
}
