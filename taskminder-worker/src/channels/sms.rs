/// SMS channel over the SMS.ru HTTP gateway
///
/// Sends a form POST with `api_id`, `to`, `msg` and `json=1`. The gateway
/// answers with a top-level status plus one entry per phone number:
///
/// ```json
/// {
///   "status": "OK",
///   "sms": { "79123456789": { "status": "OK", "sms_id": "000000-10000000" } }
/// }
/// ```
///
/// Both levels must say `OK` for the message to count as sent.

use super::{ChannelError, NotificationChannel};
use crate::config::SmsConfig;
use crate::message::ReminderMessage;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use taskminder_shared::models::task::ReminderChannel;

/// SMS.ru channel
pub struct SmsChannel {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl SmsChannel {
    pub fn new(config: &SmsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
        }
    }
}

/// Reduces a phone number to the digits the gateway expects
pub fn normalize_phone(raw: &str) -> Result<String, ChannelError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() < 7 || digits.len() > 15 {
        return Err(ChannelError::InvalidRecipient(format!(
            "phone number {:?}",
            raw
        )));
    }

    Ok(digits)
}

fn status_text(entry: &JsonValue) -> String {
    entry
        .get("status_text")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .or_else(|| {
            entry
                .get("status_code")
                .map(|code| format!("status code {}", code))
        })
        .unwrap_or_else(|| "unknown error".to_string())
}

fn is_ok(entry: &JsonValue) -> bool {
    entry.get("status").and_then(JsonValue::as_str) == Some("OK")
}

/// Interprets a gateway response for `phone`
///
/// Returns the provider's message id on success.
pub fn parse_response(body: &JsonValue, phone: &str) -> Result<Option<String>, ChannelError> {
    if !is_ok(body) {
        return Err(ChannelError::Rejected(status_text(body)));
    }

    let entries = body
        .get("sms")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| ChannelError::Transport("SMS response has no sms section".to_string()))?;

    let entry = entries
        .get(phone)
        .or_else(|| {
            if entries.len() == 1 {
                entries.values().next()
            } else {
                None
            }
        })
        .ok_or_else(|| {
            ChannelError::Transport(format!("SMS response has no entry for {}", phone))
        })?;

    if !is_ok(entry) {
        return Err(ChannelError::Rejected(status_text(entry)));
    }

    Ok(entry
        .get("sms_id")
        .and_then(JsonValue::as_str)
        .map(str::to_string))
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn kind(&self) -> ReminderChannel {
        ReminderChannel::Sms
    }

    async fn send(&self, recipient: &str, message: &ReminderMessage) -> Result<(), ChannelError> {
        let phone = normalize_phone(recipient)?;

        let response = self
            .http
            .post(&self.api_url)
            .timeout(Duration::from_secs(30))
            .form(&[
                ("api_id", self.api_key.as_str()),
                ("to", phone.as_str()),
                ("msg", message.body.as_str()),
                ("json", "1"),
            ])
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;

        let sms_id = parse_response(&body, &phone)?;

        tracing::debug!(phone = %phone, sms_id = ?sms_id, "SMS sent");
        Ok(())
    }
}
