//! # Taskminder API Server Library
//!
//! HTTP surface for Taskminder: registration, login with cookie or bearer
//! tokens, user-scoped task CRUD and on-demand reminder jobs.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and auth layer
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON body extractor with API error rejections
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
