/// Authorization helpers and visibility checks
///
/// # Permission Model
///
/// 1. **Project visibility**: a project is visible to its owner and to every
///    user holding a membership row for it
/// 2. **Inherited visibility**: tasks and comments are visible exactly when
///    their project is
/// 3. **Account ownership**: a user may only modify their own account
///
/// Membership roles are recorded but do not grant or restrict anything.
/// Invisible resources are reported as not found so their existence is not
/// disclosed.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::require_visible_project;
/// use taskboard_shared::auth::middleware::AuthContext;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, auth: AuthContext, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let project = require_visible_project(&pool, &auth, project_id).await?;
/// println!("{}", project.name);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::comment::Comment;
use crate::models::project::Project;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Project missing or not visible
    #[error("Project not found")]
    ProjectNotFound,

    /// Task missing or not visible
    #[error("Task not found")]
    TaskNotFound,

    /// Comment missing or not visible
    #[error("Comment not found")]
    CommentNotFound,

    /// Caller may see the resource but not change it
    #[error("You do not have permission to perform this action")]
    NotAuthorized,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Loads a project if it is visible to the caller
///
/// # Errors
///
/// Returns [`AuthzError::ProjectNotFound`] when the project does not exist
/// or the caller is neither its owner nor a member.
pub async fn require_visible_project(
    pool: &PgPool,
    auth: &AuthContext,
    project_id: Uuid,
) -> Result<Project, AuthzError> {
    Project::find_visible(pool, project_id, auth.user_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound)
}

/// Loads a task if its project is visible to the caller
pub async fn require_visible_task(
    pool: &PgPool,
    auth: &AuthContext,
    task_id: Uuid,
) -> Result<Task, AuthzError> {
    Task::find_visible(pool, task_id, auth.user_id)
        .await?
        .ok_or(AuthzError::TaskNotFound)
}

/// Loads a comment if the project of its task is visible to the caller
pub async fn require_visible_comment(
    pool: &PgPool,
    auth: &AuthContext,
    comment_id: Uuid,
) -> Result<Comment, AuthzError> {
    Comment::find_visible(pool, comment_id, auth.user_id)
        .await?
        .ok_or(AuthzError::CommentNotFound)
}

/// Checks the caller is the account being modified
///
/// # Example
///
/// ```
/// # use taskboard_shared::auth::authorization::require_self;
/// # use taskboard_shared::auth::middleware::AuthContext;
/// # use uuid::Uuid;
/// let me = Uuid::new_v4();
/// let auth = AuthContext::new(me);
///
/// assert!(require_self(&auth, me).is_ok());
/// assert!(require_self(&auth, Uuid::new_v4()).is_err());
/// ```
pub fn require_self(auth: &AuthContext, user_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != user_id {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_self() {
        let user_id = Uuid::new_v4();
        let auth = AuthContext::new(user_id);

        assert!(require_self(&auth, user_id).is_ok());
        assert!(matches!(
            require_self(&auth, Uuid::new_v4()),
            Err(AuthzError::NotAuthorized)
        ));
    }

    #[test]
    fn test_authz_error_display() {
        assert_eq!(AuthzError::ProjectNotFound.to_string(), "Project not found");
        assert_eq!(AuthzError::TaskNotFound.to_string(), "Task not found");
        assert!(AuthzError::NotAuthorized.to_string().contains("permission"));
    }
}
