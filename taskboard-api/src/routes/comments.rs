/// Comment endpoints
///
/// - `GET    /api/comments/` - Comments on tasks visible to the caller
/// - `POST   /api/comments/` - Comment on a visible task as the caller
/// - `GET    /api/comments/:id/` - Retrieve
/// - `PUT    /api/comments/:id/` - Replace content
/// - `PATCH  /api/comments/:id/` - Partial update
/// - `DELETE /api/comments/:id/` - Delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{not_blank, reject_blank, IdPath, ValidatedJson},
    views::{self, CommentView},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{require_visible_comment, require_visible_task, AuthzError},
        middleware::AuthContext,
    },
    models::comment::{Comment, CreateComment},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(custom(function = "not_blank"))]
    pub content: String,

    #[serde(default)]
    pub task_id: Option<Uuid>,
}

/// Replace payload; the task and author of a comment never change
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceCommentRequest {
    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchCommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub content: Option<String>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let comments = Comment::list_visible(&state.db, auth.user_id).await?;
    Ok(Json(views::comment_views(&state.db, comments).await?))
}

/// Creates a comment authored by the caller
///
/// # Errors
///
/// - `404 Not Found`: the task does not exist or is not visible
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let task_id = req.task_id.ok_or(AuthzError::TaskNotFound)?;
    let task = require_visible_task(&state.db, &auth, task_id).await?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id: task.id,
            user_id: auth.user_id,
            content: req.content,
        },
    )
    .await?;

    info!(comment_id = %comment.id, task_id = %task.id, "Comment created");

    let view = views::comment_view(&state.db, comment).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<CommentView>> {
    let comment = require_visible_comment(&state.db, &auth, id).await?;
    Ok(Json(views::comment_view(&state.db, comment).await?))
}

pub async fn replace_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ReplaceCommentRequest>,
) -> ApiResult<Json<CommentView>> {
    apply_update(&state, &auth, id, Some(req.content)).await
}

pub async fn patch_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<PatchCommentRequest>,
) -> ApiResult<Json<CommentView>> {
    reject_blank(&[("content", req.content.as_deref())])?;
    apply_update(&state, &auth, id, req.content).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = require_visible_comment(&state.db, &auth, id).await?;

    Comment::delete(&state.db, comment.id).await?;
    info!(comment_id = %comment.id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    content: Option<String>,
) -> ApiResult<Json<CommentView>> {
    let comment = require_visible_comment(&state.db, auth, id).await?;

    let comment = match content {
        Some(content) => Comment::update_content(&state.db, comment.id, content)
            .await?
            .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?,
        None => comment,
    };

    Ok(Json(views::comment_view(&state.db, comment).await?))
}
