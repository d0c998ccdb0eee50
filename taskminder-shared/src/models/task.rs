/// Task model and repository operations
///
/// Tasks are the to-do items users manage. Every user-facing operation takes
/// the owner's ID and filters on `(id, user_id)` in SQL, so a task owned by
/// someone else behaves exactly like a missing one.
///
/// # State
///
/// ```text
/// active (completed = false) <-> completed (completed = true)
/// ```
///
/// Deletion removes the row; there is no soft-delete flag.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     user_id VARCHAR(64) NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     email_notification BOOLEAN NOT NULL DEFAULT FALSE,
///     telegram_notification BOOLEAN NOT NULL DEFAULT FALSE,
///     sms_notification BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskminder_shared::models::task::{NewTask, Task, TaskPatch};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: &str) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, user_id, NewTask {
///     title: "Buy milk".to_string(),
///     ..Default::default()
/// }).await?;
///
/// let patch = TaskPatch { completed: Some(true), ..Default::default() };
/// let updated = Task::update_for_user(&pool, user_id, task.id, patch).await?;
/// assert!(updated.map(|t| t.completed).unwrap_or(false));
///
/// assert!(Task::delete_for_user(&pool, user_id, task.id).await?);
/// assert!(!Task::delete_for_user(&pool, user_id, task.id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::deserialize_present;
use super::user::User;

const TASK_COLUMNS: &str = "id, user_id, title, description, completed, email_notification, \
                            telegram_notification, sms_notification, created_at, updated_at";

/// Reminder delivery path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    Email,
    Telegram,
    Sms,
}

impl ReminderChannel {
    /// All channels, in sweep order
    pub const ALL: [ReminderChannel; 3] = [
        ReminderChannel::Email,
        ReminderChannel::Telegram,
        ReminderChannel::Sms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Email => "email",
            ReminderChannel::Telegram => "telegram",
            ReminderChannel::Sms => "sms",
        }
    }

    /// Task column holding this channel's opt-in flag
    fn flag_column(&self) -> &'static str {
        match self {
            ReminderChannel::Email => "email_notification",
            ReminderChannel::Telegram => "telegram_notification",
            ReminderChannel::Sms => "sms_notification",
        }
    }

    /// Whether `task` has opted into this channel
    pub fn is_enabled_on(&self, task: &Task) -> bool {
        match self {
            ReminderChannel::Email => task.email_notification,
            ReminderChannel::Telegram => task.telegram_notification,
            ReminderChannel::Sms => task.sms_notification,
        }
    }

    /// The user's address on this channel
    ///
    /// Blank values count as missing.
    pub fn recipient<'a>(&self, user: &'a User) -> Option<&'a str> {
        let value = match self {
            ReminderChannel::Email => Some(user.email.as_str()),
            ReminderChannel::Telegram => user.telegram_chat_id.as_deref(),
            ReminderChannel::Sms => user.phone_number.as_deref(),
        };

        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

impl std::fmt::Display for ReminderChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// To-do item owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    /// Owner
    pub user_id: String,

    pub title: String,
    pub description: Option<String>,
    pub completed: bool,

    pub email_notification: bool,
    pub telegram_notification: bool,
    pub sms_notification: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Channels this task has opted into
    pub fn enabled_channels(&self) -> Vec<ReminderChannel> {
        ReminderChannel::ALL
            .into_iter()
            .filter(|channel| channel.is_enabled_on(self))
            .collect()
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
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

/// Partial task update
///
/// `None` leaves a field untouched. `description` can also be cleared with
/// an explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,

    #[serde(default)]
    pub completed: Option<bool>,

    #[serde(default)]
    pub email_notification: Option<bool>,

    #[serde(default)]
    pub telegram_notification: Option<bool>,

    #[serde(default)]
    pub sms_notification: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.email_notification.is_none()
            && self.telegram_notification.is_none()
            && self.sms_notification.is_none()
    }
}

impl Task {
    /// Lists a user's tasks in insertion order
    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY id ASC",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Creates a task owned by `user_id`
    pub async fn create(pool: &PgPool, user_id: &str, data: NewTask) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, completed,
                               email_notification, telegram_notification, sms_notification)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.completed)
        .bind(data.email_notification)
        .bind(data.telegram_notification)
        .bind(data.sms_notification)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Finds a task by ID with owner isolation
    ///
    /// Missing and not-owned are both `None`.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: &str,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update to an owned task
    ///
    /// Only fields present in `patch` are written; `updated_at` is always
    /// bumped. Concurrent updates are last-writer-wins.
    pub async fn update_for_user(
        pool: &PgPool,
        user_id: &str,
        id: i64,
        patch: TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = patch.title {
            query.push(", title = ").push_bind(title);
        }

        if let Some(description) = patch.description {
            query.push(", description = ").push_bind(description);
        }

        if let Some(completed) = patch.completed {
            query.push(", completed = ").push_bind(completed);
        }

        if let Some(email_notification) = patch.email_notification {
            query.push(", email_notification = ").push_bind(email_notification);
        }

        if let Some(telegram_notification) = patch.telegram_notification {
            query.push(", telegram_notification = ").push_bind(telegram_notification);
        }

        if let Some(sms_notification) = patch.sms_notification {
            query.push(", sms_notification = ").push_bind(sms_notification);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" AND user_id = ").push_bind(user_id);
        query.push(" RETURNING ").push(TASK_COLUMNS);

        let mut tx = pool.begin().await?;
        let task = query.build_query_as::<Task>().fetch_optional(&mut *tx).await?;
        tx.commit().await?;

        Ok(task)
    }

    /// Deletes an owned task
    ///
    /// Returns true if a row was removed; a second call returns false.
    pub async fn delete_for_user(pool: &PgPool, user_id: &str, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Tasks across all users with `channel` enabled and not completed
    ///
    /// Worker-only: bypasses owner scoping.
    pub async fn due_for_channel(
        pool: &PgPool,
        channel: ReminderChannel,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE {} = TRUE AND completed = FALSE ORDER BY id ASC",
            TASK_COLUMNS,
            channel.flag_column()
        ))
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    pub async fn list_with_email_reminders_due(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        Self::due_for_channel(pool, ReminderChannel::Email).await
    }

    pub async fn list_with_telegram_reminders_due(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        Self::due_for_channel(pool, ReminderChannel::Telegram).await
    }

    pub async fn list_with_sms_reminders_due(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        Self::due_for_channel(pool, ReminderChannel::Sms).await
    }
}
