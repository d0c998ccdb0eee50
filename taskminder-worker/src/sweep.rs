/// Periodic reminder sweep
///
/// For each channel, loads every incomplete task that opted into it (across
/// all users), resolves the owners in one query and hands each task to the
/// [`Dispatcher`]. A failing channel query is recorded on that channel's
/// report and does not stop the other channels.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskminder_worker::dispatch::Dispatcher;
/// use taskminder_worker::sweep::ReminderSweep;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) {
/// let sweep = ReminderSweep::new(pool, Arc::new(Dispatcher::new()));
/// let report = sweep.run_once().await;
/// println!("{} tasks due", report.task_count);
/// # }
/// ```

use crate::dispatch::{DeliveryOutcome, Dispatcher};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use taskminder_shared::models::task::{ReminderChannel, Task};
use taskminder_shared::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDelivery {
    pub task_id: i64,
    pub error: String,
}

/// Outcome of one channel's pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channel: ReminderChannel,
    pub due: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: Vec<FailedDelivery>,

    /// Set when the due-task query itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelReport {
    fn empty(channel: ReminderChannel) -> Self {
        Self {
            channel,
            due: 0,
            sent: 0,
            skipped: 0,
            failed: Vec::new(),
            error: None,
        }
    }

    fn errored(channel: ReminderChannel, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::empty(channel)
        }
    }
}

/// Outcome of a full sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub status: SweepStatus,

    /// Due tasks across all channels
    pub task_count: usize,

    pub channels: Vec<ChannelReport>,
}

impl SweepReport {
    pub fn from_channels(channels: Vec<ChannelReport>) -> Self {
        let status = if channels.iter().any(|c| c.error.is_some()) {
            SweepStatus::Error
        } else {
            SweepStatus::Success
        };

        Self {
            status,
            task_count: channels.iter().map(|c| c.due).sum(),
            channels,
        }
    }

    pub fn sent(&self) -> usize {
        self.channels.iter().map(|c| c.sent).sum()
    }

    pub fn channel(&self, kind: ReminderChannel) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.channel == kind)
    }
}

/// Delivers `tasks` over `kind` using the already-loaded `owners`
pub async fn process_batch(
    dispatcher: &Dispatcher,
    kind: ReminderChannel,
    tasks: &[Task],
    owners: &HashMap<String, User>,
) -> ChannelReport {
    let mut report = ChannelReport::empty(kind);
    report.due = tasks.len();

    for task in tasks {
        match dispatcher.deliver(kind, task, owners.get(&task.user_id)).await {
            DeliveryOutcome::Sent => report.sent += 1,
            DeliveryOutcome::Skipped(_) => report.skipped += 1,
            DeliveryOutcome::Failed(error) => report.failed.push(FailedDelivery {
                task_id: task.id,
                error,
            }),
        }
    }

    report
}

/// Reminder sweep over every channel
pub struct ReminderSweep {
    db: PgPool,
    dispatcher: Arc<Dispatcher>,
}

impl ReminderSweep {
    pub fn new(db: PgPool, dispatcher: Arc<Dispatcher>) -> Self {
        Self { db, dispatcher }
    }

    /// Runs one sweep across all channels
    pub async fn run_once(&self) -> SweepReport {
        tracing::info!("Starting reminder sweep");

        let mut channels = Vec::with_capacity(ReminderChannel::ALL.len());
        for kind in ReminderChannel::ALL {
            channels.push(self.sweep_channel(kind).await);
        }

        let report = SweepReport::from_channels(channels);

        if report.task_count == 0 {
            tracing::info!("No tasks due for reminders");
        } else {
            tracing::info!(
                task_count = report.task_count,
                sent = report.sent(),
                status = ?report.status,
                "Reminder sweep finished"
            );
        }

        report
    }

    async fn sweep_channel(&self, kind: ReminderChannel) -> ChannelReport {
        let due = match kind {
            ReminderChannel::Email => Task::list_with_email_reminders_due(&self.db).await,
            ReminderChannel::Telegram => Task::list_with_telegram_reminders_due(&self.db).await,
            ReminderChannel::Sms => Task::list_with_sms_reminders_due(&self.db).await,
        };

        let tasks = match due {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(channel = %kind, error = %e, "Failed to load due tasks");
                return ChannelReport::errored(kind, e);
            }
        };

        if tasks.is_empty() {
            return ChannelReport::empty(kind);
        }

        let owner_ids: Vec<String> = tasks
            .iter()
            .map(|t| t.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let owners = match User::find_many_by_ids(&self.db, &owner_ids).await {
            Ok(users) => users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            Err(e) => {
                tracing::error!(channel = %kind, error = %e, "Failed to load task owners");
                let mut report = ChannelReport::errored(kind, e);
                report.due = tasks.len();
                return report;
            }
        };

        process_batch(&self.dispatcher, kind, &tasks, &owners).await
    }
}
