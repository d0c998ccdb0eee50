/// Email channel over an SMTP relay
///
/// Connects with STARTTLS (port 587 by default) and authenticates with the
/// sender's own address and password. Messages are plain text.

use super::{ChannelError, NotificationChannel};
use crate::config::SmtpConfig;
use crate::message::ReminderMessage;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use taskminder_shared::models::task::ReminderChannel;

/// SMTP email channel
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailChannel {
    /// Builds the channel; no connection is opened until the first send
    pub fn new(config: &SmtpConfig) -> Result<Self, ChannelError> {
        let from: Mailbox = config
            .email
            .parse()
            .map_err(|e| ChannelError::InvalidRecipient(format!("sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| ChannelError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.email.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, recipient: &str, message: &ReminderMessage) -> Result<Message, ChannelError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| ChannelError::InvalidRecipient(format!("{}: {}", recipient, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| ChannelError::InvalidRecipient(e.to_string()))
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ReminderChannel {
        ReminderChannel::Email
    }

    async fn send(&self, recipient: &str, message: &ReminderMessage) -> Result<(), ChannelError> {
        let email = self.build_message(recipient, message)?;

        self.transport.send(email).await.map_err(|e| {
            if e.is_permanent() {
                ChannelError::Rejected(e.to_string())
            } else {
                ChannelError::Transport(e.to_string())
            }
        })?;

        tracing::debug!(recipient = %recipient, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            server: "smtp.example.com".to_string(),
            port: 587,
            email: "reminders@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let mut config = config();
        config.email = "not an address".to_string();

        assert!(matches!(
            EmailChannel::new(&config),
            Err(ChannelError::InvalidRecipient(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_before_connecting() {
        let channel = EmailChannel::new(&config()).unwrap();
        let message = ReminderMessage::new("Task reminder: x", "body");

        let result = channel.send("nope", &message).await;
        assert!(matches!(result, Err(ChannelError::InvalidRecipient(_))));
    }

    #[test]
    fn test_build_message_headers() {
        let channel = EmailChannel::new(&config()).unwrap();
        let message = ReminderMessage::new("Task reminder: Buy milk", "Hello!");

        let email = channel.build_message("alice@x.io", &message).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("To: alice@x.io"));
        assert!(raw.contains("From: reminders@example.com"));
        assert!(raw.contains("Subject: Task reminder: Buy milk"));
        assert!(raw.contains("Hello!"));
    }
}
