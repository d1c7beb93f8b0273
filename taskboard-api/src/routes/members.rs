/// Project membership endpoints
///
/// - `GET    /api/projects/:id/members/` - List members
/// - `POST   /api/projects/:id/members/` - Add a member
/// - `PATCH  /api/projects/:id/members/:member_id/` - Change a member's role
/// - `DELETE /api/projects/:id/members/:member_id/` - Remove a member
///
/// Membership is what makes a project visible to users other than its
/// owner. Every endpoint requires the project itself to be visible.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, NON_FIELD_ERRORS},
    extract::{IdPath, ValidatedJson},
    views::{self, MemberView},
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
        member::{CreateProjectMember, MemberRole, ProjectMember},
        user::User,
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    pub user_id: Uuid,

    /// Defaults to `Member`
    #[serde(default)]
    pub role: MemberRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    pub role: MemberRole,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(project_id): IdPath<Uuid>,
) -> ApiResult<Json<Vec<MemberView>>> {
    let project = require_visible_project(&state.db, &auth, project_id).await?;
    let members = ProjectMember::list_by_project(&state.db, project.id).await?;

    Ok(Json(views::member_views(&state.db, members).await?))
}

/// Adds a user to a project
///
/// # Errors
///
/// - `400 Bad Request`: the user does not exist or is already a member
/// - `404 Not Found`: the project is not visible to the caller
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(project_id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberView>)> {
    let project = require_visible_project(&state.db, &auth, project_id).await?;

    if User::find_by_id(&state.db, req.user_id).await?.is_none() {
        return Err(ApiError::validation("user_id", "User does not exist."));
    }

    if ProjectMember::find_by_user(&state.db, project.id, req.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::validation(
            NON_FIELD_ERRORS,
            "This user is already a member of the project.",
        ));
    }

    // A concurrent insert still trips the unique constraint
    let member = ProjectMember::create(
        &state.db,
        CreateProjectMember {
            project_id: project.id,
            user_id: req.user_id,
            role: req.role,
        },
    )
    .await?;

    info!(
        project_id = %project.id,
        user_id = %member.user_id,
        role = member.role.as_str(),
        "Member added"
    );

    let view = views::member_view(&state.db, member).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath((project_id, member_id)): IdPath<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<UpdateMemberRequest>,
) -> ApiResult<Json<MemberView>> {
    let project = require_visible_project(&state.db, &auth, project_id).await?;

    let member = ProjectMember::update_role(&state.db, project.id, member_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    Ok(Json(views::member_view(&state.db, member).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath((project_id, member_id)): IdPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let project = require_visible_project(&state.db, &auth, project_id).await?;

    if !ProjectMember::delete(&state.db, project.id, member_id).await? {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    info!(project_id = %project.id, member_id = %member_id, "Member removed");
    Ok(StatusCode::NO_CONTENT)
}
