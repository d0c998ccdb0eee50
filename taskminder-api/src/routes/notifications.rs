/// On-demand notification endpoints
///
/// - `POST /notify/?task_id=N` - enqueue a reminder job for an owned task
/// - `GET  /status/:job_id` - poll the job
///
/// Both responses name the job identifier `task_id`, matching the job API
/// clients already use. The worker picks jobs up from `notification_jobs`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{PathParam, QueryParams},
};
use axum::{
    extract::State,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use taskminder_shared::models::{
    notification_job::{JobStatus, NotificationJob},
    task::Task,
    user::UserProfile,
};
use uuid::Uuid;

/// `/notify` query string
#[derive(Debug, Deserialize)]
pub struct NotifyQuery {
    pub task_id: i64,
}

/// Enqueue response
#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyResponse {
    /// Job identifier
    pub task_id: Uuid,
    pub status: JobStatus,
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job identifier
    pub task_id: Uuid,
    pub status: JobStatus,
    pub result: Option<JsonValue>,
}

/// Enqueue a reminder for one of the current user's tasks
///
/// # Errors
///
/// - `404 Not Found`: task missing or owned by someone else
pub async fn notify(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    QueryParams(query): QueryParams<NotifyQuery>,
) -> ApiResult<Json<NotifyResponse>> {
    let task = Task::find_for_user(&state.db, &user.id, query.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", query.task_id)))?;

    let job = NotificationJob::enqueue(&state.db, &user.id, task.id).await?;

    tracing::info!(user_id = %user.id, task_id = task.id, job_id = %job.id, "Notification job enqueued");

    Ok(Json(NotifyResponse {
        task_id: job.id,
        status: job.status,
    }))
}

/// Poll a notification job
pub async fn job_status(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    PathParam(job_id): PathParam<Uuid>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = NotificationJob::find_for_user(&state.db, &user.id, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        task_id: job.id,
        status: job.status,
        result: job.public_result(),
    }))
}
