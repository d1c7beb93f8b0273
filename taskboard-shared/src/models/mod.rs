/// Database models
///
/// Each module owns one table and exposes its queries as associated
/// functions taking a `&PgPool`.
///
/// - `user`: accounts and login lookup
/// - `project`: projects and the project visibility rule
/// - `member`: project memberships with roles
/// - `task`: tasks with status/priority enumerations
/// - `comment`: comments on tasks

pub mod comment;
pub mod member;
pub mod project;
pub mod task;
pub mod user;
