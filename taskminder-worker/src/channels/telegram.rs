/// Telegram bot API client and channel
///
/// [`TelegramClient`] wraps the two bot API methods the worker uses:
/// `sendMessage` for reminders and `getUpdates` for the chat-linking bot.
/// Every bot API response has the envelope
///
/// ```json
/// { "ok": true, "result": ... }
/// { "ok": false, "error_code": 400, "description": "Bad Request: chat not found" }
/// ```
///
/// The bot token is part of the request URL, so transport errors are
/// stripped of their URL before they are logged or stored.

use super::{ChannelError, NotificationChannel};
use crate::config::TelegramConfig;
use crate::message::ReminderMessage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskminder_shared::models::task::ReminderChannel;

/// Bot API response envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,

    #[serde(default = "Option::default")]
    pub result: Option<T>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Incoming update from `getUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,

    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,

    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Unwraps a bot API envelope into its result
pub fn parse_api_response<T: DeserializeOwned>(body: &str) -> Result<T, ChannelError> {
    let response: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| ChannelError::Transport(format!("Malformed bot API response: {}", e)))?;

    if !response.ok {
        return Err(ChannelError::Rejected(
            response
                .description
                .unwrap_or_else(|| "Unknown bot API error".to_string()),
        ));
    }

    response
        .result
        .ok_or_else(|| ChannelError::Transport("Bot API response has no result".to_string()))
}

/// Minimal Telegram bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,

    /// `<api_url>/bot<token>`
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
        }
    }

    /// Sends a text message to a chat
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let response = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .timeout(Duration::from_secs(30))
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(transport_error)?;

        let body = response.text().await.map_err(transport_error)?;
        parse_api_response::<serde_json::Value>(&body)?;

        Ok(())
    }

    /// Long-polls for updates after `offset`
    ///
    /// Blocks server-side for up to `timeout_secs` when there is nothing new.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, ChannelError> {
        let mut query = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .timeout(Duration::from_secs(timeout_secs + 10))
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;

        let body = response.text().await.map_err(transport_error)?;
        parse_api_response(&body)
    }
}

fn transport_error(err: reqwest::Error) -> ChannelError {
    ChannelError::Transport(err.without_url().to_string())
}

/// Reminder channel delivering through the bot API
pub struct TelegramChannel {
    client: TelegramClient,
}

impl TelegramChannel {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn kind(&self) -> ReminderChannel {
        ReminderChannel::Telegram
    }

    async fn send(&self, recipient: &str, message: &ReminderMessage) -> Result<(), ChannelError> {
        let chat_id = recipient.trim();
        if chat_id.is_empty() {
            return Err(ChannelError::InvalidRecipient("empty chat id".to_string()));
        }

        self.client.send_message(chat_id, &message.body).await?;

        tracing::debug!(chat_id = %chat_id, "Telegram message sent");
        Ok(())
    }
}
