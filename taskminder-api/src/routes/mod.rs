/// API route handlers, organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: register, login, refresh, current user, contacts
/// - `tasks`: user-scoped task CRUD
/// - `notifications`: on-demand reminder jobs

pub mod auth;
pub mod health;
pub mod notifications;
pub mod tasks;
