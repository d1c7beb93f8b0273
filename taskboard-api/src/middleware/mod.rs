/// Middleware modules for the API server
///
/// - Security headers
///
/// Authentication lives in `taskboard_shared::auth::middleware` and is
/// wired up in [`crate::app`].

pub mod security;
