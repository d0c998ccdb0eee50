/// Middleware for the API server
///
/// - `security`: security response headers
///
/// Authentication lives in `app::auth_layer`, next to the routes it guards.

pub mod security;
