/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Register, login and token refresh
/// - `users`: User accounts
/// - `projects`: Projects and their task lists
/// - `members`: Project memberships
/// - `tasks`: Tasks and their comment lists
/// - `comments`: Comments

pub mod health;
pub mod auth;
pub mod users;
pub mod projects;
pub mod members;
pub mod tasks;
pub mod comments;
