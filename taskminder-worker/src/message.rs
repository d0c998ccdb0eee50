/// Reminder message rendering
///
/// One message shape serves every channel: email uses `subject` and `body`,
/// Telegram and SMS send `body` alone.

use taskminder_shared::models::task::Task;

/// Rendered reminder for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub subject: String,
    pub body: String,
}

impl ReminderMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Renders the reminder for an incomplete task
    pub fn for_task(task: &Task) -> Self {
        let description = task
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("No description");

        Self {
            subject: format!("Task reminder: {}", task.title),
            body: format!(
                "Hello! This is a reminder about your task:\n\n\
                 Title: {}\n\
                 Description: {}\n\n\
                 The task is not completed yet. Please finish it!\n",
                task.title, description
            ),
        }
    }
}
