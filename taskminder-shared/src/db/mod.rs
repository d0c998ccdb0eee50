/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded migration runner
///
/// Models and their queries are in the crate-level `models` module.

pub mod migrations;
pub mod pool;
