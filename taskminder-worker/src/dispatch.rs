/// Reminder dispatcher
///
/// Routes one reminder for one task to one channel. Channels are registered
/// at start-up from configuration; a channel that was never registered is
/// treated as unavailable and its deliveries are skipped, not failed.
///
/// # Outcomes
///
/// ```text
/// channel not registered  -> Skipped
/// owner missing           -> Skipped
/// no recipient on owner   -> Skipped
/// provider error          -> Failed
/// otherwise               -> Sent
/// ```

use crate::channels::{
    ChannelError, EmailChannel, NotificationChannel, SmsChannel, TelegramChannel, TelegramClient,
};
use crate::config::WorkerConfig;
use crate::message::ReminderMessage;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use taskminder_shared::models::task::{ReminderChannel, Task};
use taskminder_shared::models::user::User;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Skipped(String),
    Failed(String),
}

impl DeliveryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "sent",
            DeliveryOutcome::Skipped(_) => "skipped",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }

    /// JSON form stored in job results
    pub fn to_json(&self) -> JsonValue {
        match self {
            DeliveryOutcome::Sent => json!({ "status": "sent" }),
            DeliveryOutcome::Skipped(reason) => json!({ "status": "skipped", "reason": reason }),
            DeliveryOutcome::Failed(error) => json!({ "status": "failed", "error": error }),
        }
    }
}

/// Channel registry plus delivery logic
#[derive(Default)]
pub struct Dispatcher {
    channels: HashMap<ReminderChannel, Arc<dyn NotificationChannel>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every channel whose credentials are configured
    pub fn from_config(config: &WorkerConfig) -> Result<Self, ChannelError> {
        let mut dispatcher = Self::new();

        if let Some(smtp) = &config.smtp {
            dispatcher.register(Arc::new(EmailChannel::new(smtp)?));
        }
        if let Some(telegram) = &config.telegram {
            dispatcher.register(Arc::new(TelegramChannel::new(TelegramClient::new(telegram))));
        }
        if let Some(sms) = &config.sms {
            dispatcher.register(Arc::new(SmsChannel::new(sms)));
        }

        Ok(dispatcher)
    }

    /// Registers a channel, replacing any previous one of the same kind
    pub fn register(&mut self, channel: Arc<dyn NotificationChannel>) {
        let kind = channel.kind();
        tracing::info!(channel = %kind, "Registering notification channel");
        self.channels.insert(kind, channel);
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.register(channel);
        self
    }

    pub fn is_registered(&self, kind: ReminderChannel) -> bool {
        self.channels.contains_key(&kind)
    }

    /// Registered channel kinds in sweep order
    pub fn registered(&self) -> Vec<ReminderChannel> {
        ReminderChannel::ALL
            .into_iter()
            .filter(|kind| self.is_registered(*kind))
            .collect()
    }

    /// Delivers the reminder for `task` to its owner over `kind`
    pub async fn deliver(
        &self,
        kind: ReminderChannel,
        task: &Task,
        owner: Option<&User>,
    ) -> DeliveryOutcome {
        let outcome = self.attempt(kind, task, owner).await;

        match &outcome {
            DeliveryOutcome::Sent => {
                tracing::info!(channel = %kind, task_id = task.id, user_id = %task.user_id, "Reminder sent");
            }
            DeliveryOutcome::Skipped(reason) => {
                tracing::debug!(channel = %kind, task_id = task.id, reason = %reason, "Reminder skipped");
            }
            DeliveryOutcome::Failed(error) => {
                tracing::warn!(channel = %kind, task_id = task.id, error = %error, "Reminder delivery failed");
            }
        }

        outcome
    }

    async fn attempt(
        &self,
        kind: ReminderChannel,
        task: &Task,
        owner: Option<&User>,
    ) -> DeliveryOutcome {
        let Some(channel) = self.channels.get(&kind) else {
            return DeliveryOutcome::Skipped(format!("{} channel not configured", kind));
        };

        let Some(owner) = owner else {
            return DeliveryOutcome::Skipped("task owner not found".to_string());
        };

        let Some(recipient) = kind.recipient(owner) else {
            return DeliveryOutcome::Skipped(format!("owner has no {} recipient", kind));
        };

        match channel.send(recipient, &ReminderMessage::for_task(task)).await {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        }
    }
}
