///! # Taskminder Worker Library
///!
///! Background side of Taskminder: periodic reminder sweeps, on-demand
///! notification jobs and the Telegram chat-linking bot.
///!
///! ## Modules
///!
///! - `channels`: email, Telegram and SMS delivery
///! - `dispatch`: routes one reminder to one channel
///! - `sweep`: periodic reminder sweep
///! - `queue` / `jobs`: notification job claiming and execution
///! - `orchestrator`: scheduling loop
///! - `telegram_link`: `/start <user_id>` bot
///!
///! ## Example
///!
///! ```no_run
///! use std::sync::Arc;
///! use taskminder_worker::channels::RecordingChannel;
///! use taskminder_worker::dispatch::Dispatcher;
///! use taskminder_shared::models::task::ReminderChannel;
///!
///! let dispatcher = Dispatcher::new()
///!     .with_channel(Arc::new(RecordingChannel::new(ReminderChannel::Email)));
///! assert!(dispatcher.is_registered(ReminderChannel::Email));
///! ```

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod jobs;
pub mod message;
pub mod orchestrator;
pub mod queue;
pub mod sweep;
pub mod telegram_link;
