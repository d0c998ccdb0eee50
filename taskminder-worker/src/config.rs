/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
/// - `REMINDER_INTERVAL_MINUTES`: reminder sweep period (default: 60)
/// - `JOB_POLL_INTERVAL_SECS`: notification job poll period (default: 2)
/// - `JOB_BATCH_SIZE`: jobs claimed per poll (default: 10)
/// - `JOB_STALE_AFTER_SECS`: running jobs older than this are requeued (default: 600)
/// - `SMTP_SERVER` / `SMTP_PORT`: relay (default: smtp.gmail.com:587, STARTTLS)
/// - `SMTP_EMAIL` / `SMTP_PASSWORD`: sender credentials
/// - `TELEGRAM_BOT_TOKEN`: bot API token
/// - `TELEGRAM_API_URL`: bot API base (default: https://api.telegram.org)
/// - `SMSRU_API_KEY`: SMS.ru API id
/// - `SMSRU_API_URL`: SMS.ru endpoint (default: https://sms.ru/sms/send)
///
/// A channel whose credentials are missing is left out of the dispatcher.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use taskminder_shared::db::pool::DatabaseConfig;

pub const DEFAULT_SMSRU_API_URL: &str = "https://sms.ru/sms/send";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,

    /// Time between reminder sweeps
    pub reminder_interval: Duration,

    /// Time between notification job polls
    pub job_poll_interval: Duration,

    /// Jobs claimed per poll
    pub job_batch_size: usize,

    /// Running jobs older than this are requeued
    pub job_stale_after: Duration,

    pub smtp: Option<SmtpConfig>,
    pub telegram: Option<TelegramConfig>,
    pub sms: Option<SmsConfig>,
}

/// SMTP relay settings
#[derive(Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,

    /// Sender address, also the SMTP login
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Telegram bot settings
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// SMS.ru settings
#[derive(Clone)]
pub struct SmsConfig {
    pub api_key: String,
    pub api_url: String,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let reminder_minutes: u64 = parse_var("REMINDER_INTERVAL_MINUTES", 60)?;
        let poll_secs: u64 = parse_var("JOB_POLL_INTERVAL_SECS", 2)?;
        let job_batch_size: usize = parse_var("JOB_BATCH_SIZE", 10)?;
        let stale_secs: u64 = parse_var("JOB_STALE_AFTER_SECS", 600)?;

        if reminder_minutes == 0 || poll_secs == 0 || job_batch_size == 0 || stale_secs == 0 {
            anyhow::bail!("Intervals and batch size must be positive");
        }

        let smtp = match (non_empty("SMTP_EMAIL"), non_empty("SMTP_PASSWORD")) {
            (Some(email), Some(password)) => Some(SmtpConfig {
                server: non_empty("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: parse_var("SMTP_PORT", 587)?,
                email,
                password,
            }),
            _ => None,
        };

        let telegram = non_empty("TELEGRAM_BOT_TOKEN").map(|bot_token| TelegramConfig {
            bot_token,
            api_url: non_empty("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
        });

        let sms = non_empty("SMSRU_API_KEY").map(|api_key| SmsConfig {
            api_key,
            api_url: non_empty("SMSRU_API_URL").unwrap_or_else(|| DEFAULT_SMSRU_API_URL.to_string()),
        });

        Ok(Self {
            database_url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            reminder_interval: Duration::from_secs(reminder_minutes * 60),
            job_poll_interval: Duration::from_secs(poll_secs),
            job_batch_size,
            job_stale_after: Duration::from_secs(stale_secs),
            smtp,
            telegram,
            sms,
        })
    }

    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone(), self.max_connections)
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        None => Ok(default),
    }
}
