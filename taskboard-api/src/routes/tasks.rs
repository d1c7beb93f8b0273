/// Task endpoints
///
/// - `GET    /api/tasks/` - Tasks in projects visible to the caller
/// - `POST   /api/tasks/` - Create a task in a visible project
/// - `GET    /api/tasks/:id/` - Retrieve
/// - `PUT    /api/tasks/:id/` - Replace
/// - `PATCH  /api/tasks/:id/` - Partial update
/// - `DELETE /api/tasks/:id/` - Delete with its comments
/// - `GET    /api/tasks/:id/comments/` - Comments on the task
///
/// The project of a task is fixed at creation; `project_id` in update
/// payloads is ignored.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{deserialize_some, not_blank, reject_blank, IdPath, ValidatedJson},
    views::{self, CommentView, TaskView},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{require_visible_project, require_visible_task, AuthzError},
        middleware::AuthContext,
    },
    models::{
        comment::Comment,
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        user::User,
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        length(min = 1, max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub description: String,

    pub due_date: DateTime<Utc>,

    /// Absent is treated like an unknown project
    #[serde(default)]
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub assigned_to_id: Option<Uuid>,
}

/// Full replacement; status, priority and assignee keep their current
/// values when omitted
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceTaskRequest {
    #[validate(
        length(min = 1, max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub description: String,

    pub due_date: DateTime<Utc>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to_id: Option<Option<Uuid>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    /// Absent leaves the assignee unchanged, `null` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to_id: Option<Option<Uuid>>,
}

impl From<ReplaceTaskRequest> for UpdateTask {
    fn from(req: ReplaceTaskRequest) -> Self {
        UpdateTask {
            title: Some(req.title.trim().to_string()),
            description: Some(req.description),
            status: req.status,
            priority: req.priority,
            assigned_to_id: req.assigned_to_id,
            due_date: Some(req.due_date),
        }
    }
}

impl From<PatchTaskRequest> for UpdateTask {
    fn from(req: PatchTaskRequest) -> Self {
        UpdateTask {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            status: req.status,
            priority: req.priority,
            assigned_to_id: req.assigned_to_id,
            due_date: req.due_date,
        }
    }
}

/// Checks an assignee references an existing user
async fn check_assignee(state: &AppState, assignee: Option<Uuid>) -> ApiResult<()> {
    if let Some(user_id) = assignee {
        if User::find_by_id(&state.db, user_id).await?.is_none() {
            return Err(ApiError::validation("assigned_to_id", "User does not exist."));
        }
    }
    Ok(())
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = Task::list_visible(&state.db, auth.user_id).await?;
    Ok(Json(views::task_views(&state.db, tasks).await?))
}

/// Creates a task
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or the assignee does not exist
/// - `404 Not Found`: the project does not exist or is not visible
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let project_id = req.project_id.ok_or(AuthzError::ProjectNotFound)?;
    let project = require_visible_project(&state.db, &auth, project_id).await?;
    check_assignee(&state, req.assigned_to_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: project.id,
            title: req.title.trim().to_string(),
            description: req.description,
            status: req.status,
            priority: req.priority,
            assigned_to_id: req.assigned_to_id,
            due_date: req.due_date,
        },
    )
    .await?;

    info!(
        task_id = %task.id,
        project_id = %project.id,
        status = task.status.as_str(),
        priority = task.priority.as_str(),
        "Task created"
    );

    let view = views::task_view(&state.db, task).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = require_visible_task(&state.db, &auth, id).await?;
    Ok(Json(views::task_view(&state.db, task).await?))
}

pub async fn replace_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ReplaceTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    apply_update(&state, &auth, id, req.into()).await
}

pub async fn patch_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<PatchTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    reject_blank(&[
        ("title", req.title.as_deref()),
        ("description", req.description.as_deref()),
    ])?;
    apply_update(&state, &auth, id, req.into()).await
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<StatusCode> {
    let task = require_visible_task(&state.db, &auth, id).await?;

    Task::delete(&state.db, task.id).await?;
    info!(task_id = %task.id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the comments on a visible task
pub async fn task_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let task = require_visible_task(&state.db, &auth, id).await?;
    let comments = Comment::list_by_task(&state.db, task.id).await?;

    Ok(Json(views::comment_views(&state.db, comments).await?))
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    update: UpdateTask,
) -> ApiResult<Json<TaskView>> {
    require_visible_task(&state.db, auth, id).await?;
    check_assignee(state, update.assigned_to_id.flatten()).await?;

    let task = Task::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    info!(
        task_id = %task.id,
        status = task.status.as_str(),
        priority = task.priority.as_str(),
        "Task updated"
    );

    Ok(Json(views::task_view(&state.db, task).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    #[test]
    fn test_create_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(&format!(
            r#"{{"title": "Write docs", "description": "All of them",
                "due_date": "2030-01-01T00:00:00Z", "project_id": "{}"}}"#,
            PROJECT
        ))
        .unwrap();

        assert_eq!(req.status, TaskStatus::ToDo);
        assert_eq!(req.priority, TaskPriority::Medium);
        assert!(req.assigned_to_id.is_none());
        assert!(req.project_id.is_some());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_without_project_deserializes() {
        let req: CreateTaskRequest = serde_json::from_str(
            r#"{"title": "Orphan", "description": "d", "due_date": "2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(req.project_id.is_none());
    }

    #[test]
    fn test_status_wire_names() {
        let req: PatchTaskRequest =
            serde_json::from_str(r#"{"status": "In Progress", "priority": "High"}"#).unwrap();
        assert_eq!(req.status, Some(TaskStatus::InProgress));
        assert_eq!(req.priority, Some(TaskPriority::High));

        assert!(serde_json::from_str::<PatchTaskRequest>(r#"{"status": "Blocked"}"#).is_err());
    }

    #[test]
    fn test_patch_clears_assignee_with_null() {
        let req: PatchTaskRequest = serde_json::from_str(r#"{"assigned_to_id": null}"#).unwrap();
        let update: UpdateTask = req.into();
        assert_eq!(update.assigned_to_id, Some(None));

        let req: PatchTaskRequest = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        let update: UpdateTask = req.into();
        assert_eq!(update.assigned_to_id, None);
        assert_eq!(update.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_replace_ignores_project_id() {
        let req: ReplaceTaskRequest = serde_json::from_str(&format!(
            r#"{{"title": "T", "description": "D", "due_date": "2030-01-01T00:00:00Z",
                "project_id": "{}"}}"#,
            PROJECT
        ))
        .unwrap();

        let update: UpdateTask = req.into();
        assert!(update.status.is_none());
        assert!(update.assigned_to_id.is_none());
        assert!(update.due_date.is_some());
    }
}
