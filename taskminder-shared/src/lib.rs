//! # Taskminder Shared Library
//!
//! Types and business logic shared by the Taskminder API server and the
//! reminder worker.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWT tokens, credential extraction, identity resolution
//! - `db`: connection pool and migrations
//! - `models`: users, tasks and notification jobs with their queries

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskminder shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
