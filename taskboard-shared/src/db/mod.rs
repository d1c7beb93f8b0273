/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded schema migrations
///
/// Entity queries live in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
