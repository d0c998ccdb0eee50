/// Notification channels
///
/// Every delivery path implements [`NotificationChannel`]. The dispatcher
/// holds one boxed channel per [`ReminderChannel`] kind and never knows which
/// transport sits behind it.
///
/// # Channels
///
/// - **Email**: SMTP relay with STARTTLS (`lettre`)
/// - **Telegram**: bot API `sendMessage` (`reqwest`)
/// - **SMS**: SMS.ru HTTP gateway (`reqwest`)
/// - **Recording**: in-memory channel for tests
///
/// # Example
///
/// ```no_run
/// use taskminder_worker::channels::{NotificationChannel, RecordingChannel};
/// use taskminder_worker::message::ReminderMessage;
/// use taskminder_shared::models::task::ReminderChannel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let channel = RecordingChannel::new(ReminderChannel::Email);
/// channel.send("alice@x.io", &ReminderMessage::new("Hi", "Body")).await?;
/// assert_eq!(channel.sent().len(), 1);
/// # Ok(())
/// # }
/// ```

pub mod email;
pub mod mock;
pub mod sms;
pub mod telegram;

pub use email::EmailChannel;
pub use mock::RecordingChannel;
pub use sms::SmsChannel;
pub use telegram::{TelegramChannel, TelegramClient};

use crate::message::ReminderMessage;
use async_trait::async_trait;
use taskminder_shared::models::task::ReminderChannel;

/// Channel delivery errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelError {
    /// Recipient address is malformed for this channel
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Network or protocol failure talking to the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider accepted the request but refused to deliver
    #[error("Rejected by provider: {0}")]
    Rejected(String),
}

/// A delivery path for reminders
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Which channel kind this delivers
    fn kind(&self) -> ReminderChannel;

    /// Sends `message` to `recipient`
    ///
    /// `recipient` is an email address, a Telegram chat ID or a phone number
    /// depending on [`kind`](Self::kind).
    async fn send(&self, recipient: &str, message: &ReminderMessage) -> Result<(), ChannelError>;
}
