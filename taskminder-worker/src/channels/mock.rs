/// In-memory channel that records deliveries
///
/// Used by tests to observe what the dispatcher would have sent. Individual
/// recipients can be made to fail.

use super::{ChannelError, NotificationChannel};
use crate::message::ReminderMessage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use taskminder_shared::models::task::ReminderChannel;

/// Recording channel
pub struct RecordingChannel {
    kind: ReminderChannel,
    sent: Mutex<Vec<(String, ReminderMessage)>>,
    failures: Mutex<HashMap<String, ChannelError>>,
}

impl RecordingChannel {
    pub fn new(kind: ReminderChannel) -> Self {
        Self {
            kind,
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Makes every send to `recipient` fail with `error`
    pub fn fail_for(self, recipient: impl Into<String>, error: ChannelError) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(recipient.into(), error);
        }
        self
    }

    /// Deliveries so far, in order
    pub fn sent(&self) -> Vec<(String, ReminderMessage)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Recipients delivered to so far, in order
    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|(to, _)| to).collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ReminderChannel {
        self.kind
    }

    async fn send(&self, recipient: &str, message: &ReminderMessage) -> Result<(), ChannelError> {
        let failure = self
            .failures
            .lock()
            .ok()
            .and_then(|failures| failures.get(recipient).cloned());
        if let Some(error) = failure {
            return Err(error);
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient.to_string(), message.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let channel = RecordingChannel::new(ReminderChannel::Sms);
        let message = ReminderMessage::new("s", "b");

        channel.send("111", &message).await.unwrap();
        channel.send("222", &message).await.unwrap();

        assert_eq!(channel.kind(), ReminderChannel::Sms);
        assert_eq!(channel.recipients(), vec!["111", "222"]);
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let channel = RecordingChannel::new(ReminderChannel::Email)
            .fail_for("bad@x.io", ChannelError::Rejected("mailbox full".to_string()));
        let message = ReminderMessage::new("s", "b");

        assert!(channel.send("bad@x.io", &message).await.is_err());
        assert!(channel.send("ok@x.io", &message).await.is_ok());
        assert_eq!(channel.recipients(), vec!["ok@x.io"]);
    }
}
