/// Telegram chat-linking bot
///
/// Users link their Telegram chat by messaging the bot `/start <user_id>`.
/// The bot stores the chat's id on that user so the Telegram channel can
/// reach them, then replies with a confirmation. Any other text is ignored.
///
/// Updates are fetched with `getUpdates` long polling; the offset advances
/// past every update seen, handled or not.

use crate::channels::{ChannelError, TelegramClient};
use crate::channels::telegram::Update;
use sqlx::PgPool;
use std::time::Duration;
use taskminder_shared::models::user::User;
use tokio_util::sync::CancellationToken;

pub const LINKED_REPLY: &str = "Your Telegram Chat ID has been saved!";
pub const USAGE_REPLY: &str = "Please provide your user id. Example: /start <user_id>";
pub const UNKNOWN_USER_REPLY: &str = "No user with that id. Example: /start <user_id>";
pub const ERROR_REPLY: &str = "Something went wrong, please try again later.";

/// Long-poll timeout passed to `getUpdates`
const POLL_TIMEOUT_SECS: u64 = 30;

/// Parsed `/start` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartCommand {
    Link(String),
    MissingUserId,
}

/// Parses `/start`, `/start <user_id>` and `/start@BotName <user_id>`
///
/// Returns `None` for anything that is not a `/start` command.
pub fn parse_start_command(text: &str) -> Option<StartCommand> {
    let mut parts = text.split_whitespace();
    let command = parts.next()?;

    let name = command.split('@').next()?;
    if name != "/start" {
        return None;
    }

    match parts.next() {
        Some(user_id) => Some(StartCommand::Link(user_id.to_string())),
        None => Some(StartCommand::MissingUserId),
    }
}

/// Bot that links chats to users
pub struct TelegramLinker {
    db: PgPool,
    client: TelegramClient,
    offset: Option<i64>,
}

impl TelegramLinker {
    pub fn new(db: PgPool, client: TelegramClient) -> Self {
        Self {
            db,
            client,
            offset: None,
        }
    }

    /// Applies a message from `chat_id` and returns the reply to send, if any
    pub async fn handle_message(&self, chat_id: i64, text: &str) -> Option<&'static str> {
        let command = parse_start_command(text)?;

        let user_id = match command {
            StartCommand::Link(user_id) => user_id,
            StartCommand::MissingUserId => return Some(USAGE_REPLY),
        };

        let reply = match User::attach_telegram_chat_id(&self.db, &user_id, &chat_id.to_string()).await {
            Ok(Some(user)) => {
                tracing::info!(user_id = %user.id, chat_id = chat_id, "Linked Telegram chat");
                LINKED_REPLY
            }
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "Telegram link for unknown user");
                UNKNOWN_USER_REPLY
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save Telegram chat id");
                ERROR_REPLY
            }
        };

        Some(reply)
    }

    async fn handle_update(&self, update: &Update) {
        let Some(message) = &update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };

        if let Some(reply) = self.handle_message(message.chat.id, text).await {
            if let Err(e) = self
                .client
                .send_message(&message.chat.id.to_string(), reply)
                .await
            {
                tracing::warn!(chat_id = message.chat.id, error = %e, "Failed to send bot reply");
            }
        }
    }

    /// Fetches and handles one batch of updates
    pub async fn poll_once(&mut self, timeout_secs: u64) -> Result<usize, ChannelError> {
        let updates = self.client.get_updates(self.offset, timeout_secs).await?;

        for update in &updates {
            self.handle_update(update).await;
            self.offset = Some(update.update_id + 1);
        }

        Ok(updates.len())
    }

    /// Polls until `shutdown` is cancelled
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Telegram linking bot started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.poll_once(POLL_TIMEOUT_SECS) => {
                    if let Err(e) = polled {
                        tracing::warn!(error = %e, "Telegram getUpdates failed");
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                        }
                    }
                }
            }
        }

        tracing::info!("Telegram linking bot stopped");
    }
}
