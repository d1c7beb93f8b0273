/// Project endpoints
///
/// - `GET    /api/projects/` - Projects visible to the caller
/// - `POST   /api/projects/` - Create a project owned by the caller
/// - `GET    /api/projects/:id/` - Retrieve
/// - `PUT    /api/projects/:id/` - Replace name and description
/// - `PATCH  /api/projects/:id/` - Partial update
/// - `DELETE /api/projects/:id/` - Delete with all tasks and comments
/// - `GET    /api/projects/:id/tasks/` - Tasks of the project
///
/// A project the caller can neither own nor belong to answers 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{not_blank, reject_blank, IdPath, ValidatedJson},
    views::{self, ProjectView, TaskView},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::{authorization::require_visible_project, middleware::AuthContext},
    models::{
        project::{CreateProject, Project, UpdateProject},
        task::Task,
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create or replace payload
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(
        length(min = 1, max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(custom(function = "not_blank"))]
    pub description: String,
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: Option<String>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let projects = Project::list_visible(&state.db, auth.user_id).await?;
    Ok(Json(views::project_views(&state.db, projects).await?))
}

/// Creates a project; the caller becomes its owner and `Admin` member
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    let (project, _membership) = Project::create_with_owner(
        &state.db,
        CreateProject {
            name: req.name.trim().to_string(),
            description: req.description,
            owner_id: auth.user_id,
        },
    )
    .await?;

    info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    let view = views::project_view(&state.db, project).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<ProjectView>> {
    let project = require_visible_project(&state.db, &auth, id).await?;
    Ok(Json(views::project_view(&state.db, project).await?))
}

pub async fn replace_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    let update = UpdateProject {
        name: Some(req.name.trim().to_string()),
        description: Some(req.description),
    };
    apply_update(&state, &auth, id, update).await
}

pub async fn patch_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<PatchProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    reject_blank(&[
        ("name", req.name.as_deref()),
        ("description", req.description.as_deref()),
    ])?;

    let update = UpdateProject {
        name: req.name.map(|n| n.trim().to_string()),
        description: req.description,
    };
    apply_update(&state, &auth, id, update).await
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<StatusCode> {
    let project = require_visible_project(&state.db, &auth, id).await?;

    Project::delete(&state.db, project.id).await?;
    info!(project_id = %project.id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the tasks of a visible project
pub async fn project_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let project = require_visible_project(&state.db, &auth, id).await?;
    let tasks = Task::list_by_project(&state.db, project.id).await?;

    Ok(Json(views::task_views(&state.db, tasks).await?))
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    update: UpdateProject,
) -> ApiResult<Json<ProjectView>> {
    require_visible_project(&state.db, auth, id).await?;

    let project = Project::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(views::project_view(&state.db, project).await?))
}
