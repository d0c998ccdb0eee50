/// Database models and their queries
///
/// # Models
///
/// - `user`: accounts, credentials and contact fields
/// - `task`: to-do items, always queried through their owner
/// - `notification_job`: on-demand reminder jobs processed by the worker
///
/// Ownership runs one way: a task row holds its `user_id`, and a user's tasks
/// are fetched with an explicit query rather than through a back-reference.

pub mod notification_job;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes a present field into `Some`, so that `Option<Option<T>>`
/// distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use together with `#[serde(default)]`.
pub fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
