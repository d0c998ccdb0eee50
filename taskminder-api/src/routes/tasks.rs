/// Task endpoints
///
/// All handlers run behind the auth layer and pass the current user's ID into
/// every repository call. A task owned by another user is indistinguishable
/// from a missing one: both are 404.
///
/// - `GET    /tasks` - List the current user's tasks
/// - `POST   /tasks` - Create a task (201)
/// - `GET    /tasks/:id` - Fetch one task
/// - `PUT    /tasks/:id` - Partial update (also `PATCH`)
/// - `DELETE /tasks/:id` - Delete (204)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ensure_storable, JsonBody, PathParam},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskminder_shared::models::{
    task::{NewTask, Task, TaskPatch},
    user::UserProfile,
};
use validator::Validate;

const MAX_TITLE_LEN: usize = 255;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub email_notification: bool,

    #[serde(default)]
    pub telegram_notification: bool,

    #[serde(default)]
    pub sms_notification: bool,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title.trim().to_string(),
            description: req.description,
            completed: req.completed,
            email_notification: req.email_notification,
            telegram_notification: req.telegram_notification,
            sms_notification: req.sms_notification,
        }
    }
}

fn task_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Task {} not found", id))
}

/// List the current user's tasks in creation order
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_user(&state.db, &user.id).await?;
    Ok(Json(tasks))
}

/// Create a task
///
/// ```text
/// POST /tasks
///
/// { "title": "Buy milk", "email_notification": true }
/// ```
///
/// Returns `201 Created` with the stored task; `completed` and the channel
/// flags default to false.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(ApiError::from_validation)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be blank".to_string()));
    }

    ensure_storable("title", &req.title)?;
    if let Some(description) = &req.description {
        ensure_storable("description", description)?;
    }

    let task = Task::create(&state.db, &user.id, NewTask::from(req)).await?;

    tracing::info!(user_id = %user.id, task_id = task.id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetch one of the current user's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_for_user(&state.db, &user.id, id)
        .await?
        .ok_or_else(|| task_not_found(id))?;

    Ok(Json(task))
}

/// Partially update a task
///
/// Only the fields present in the body change. `description: null` clears
/// the description; `title` cannot be cleared. A body with no task fields
/// is a 400.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    PathParam(id): PathParam<i64>,
    JsonBody(mut patch): JsonBody<TaskPatch>,
) -> ApiResult<Json<Task>> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No task fields supplied".to_string()));
    }

    if let Some(title) = patch.title.as_mut() {
        *title = title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(ApiError::BadRequest(
                "Title must be 1-255 characters".to_string(),
            ));
        }
        ensure_storable("title", title)?;
    }

    if let Some(Some(description)) = &patch.description {
        ensure_storable("description", description)?;
    }

    let task = Task::update_for_user(&state.db, &user.id, id, patch)
        .await?
        .ok_or_else(|| task_not_found(id))?;

    tracing::debug!(user_id = %user.id, task_id = task.id, "Task updated");

    Ok(Json(task))
}

/// Delete a task
///
/// `204 No Content` the first time, `404` afterwards.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !Task::delete_for_user(&state.db, &user.id, id).await? {
        return Err(task_not_found(id));
    }

    tracing::info!(user_id = %user.id, task_id = id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": " Buy milk "}"#).unwrap();
        assert!(req.validate().is_ok());

        let task = NewTask::from(req);
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
        assert!(!task.email_notification);
    }

    #[test]
    fn test_create_request_title_bounds() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(req.validate().is_err());

        let long = "x".repeat(256);
        let req: CreateTaskRequest =
            serde_json::from_value(serde_json::json!({ "title": long })).unwrap();
        assert!(req.validate().is_err());
    }
}
