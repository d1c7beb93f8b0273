/// User endpoints
///
/// - `GET    /api/users/` - List users
/// - `POST   /api/users/` - Create a user (registration payload, no tokens)
/// - `GET    /api/users/:id/` - Retrieve a user
/// - `PUT    /api/users/:id/` - Replace own profile
/// - `PATCH  /api/users/:id/` - Update own profile
/// - `DELETE /api/users/:id/` - Delete own account
///
/// Any authenticated user may read any user. Only the account holder may
/// modify or delete it (403 otherwise).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{not_blank, reject_blank, IdPath, ValidatedJson},
    routes::auth::{create_account, RegisterRequest},
    views::UserView,
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::{authorization::require_self, middleware::AuthContext},
    models::user::{normalize_email, UpdateUser, User},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Full profile replacement
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has no more than 150 characters."),
        custom(function = "not_blank")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(
        length(min = 1, max = 30, message = "Ensure this field has no more than 30 characters."),
        custom(function = "not_blank")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = 30, message = "Ensure this field has no more than 30 characters."),
        custom(function = "not_blank")
    )]
    pub last_name: String,
}

/// Partial profile update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchUserRequest {
    #[validate(length(min = 1, max = 150, message = "Ensure this field has 1 to 150 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Ensure this field has 1 to 30 characters."))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Ensure this field has 1 to 30 characters."))]
    pub last_name: Option<String>,
}

impl From<ReplaceUserRequest> for UpdateUser {
    fn from(req: ReplaceUserRequest) -> Self {
        PatchUserRequest {
            username: Some(req.username),
            email: Some(req.email),
            first_name: Some(req.first_name),
            last_name: Some(req.last_name),
        }
        .into()
    }
}

impl From<PatchUserRequest> for UpdateUser {
    fn from(req: PatchUserRequest) -> Self {
        UpdateUser {
            username: req.username.map(|s| s.trim().to_string()),
            email: req.email.as_deref().map(normalize_email),
            first_name: req.first_name.map(|s| s.trim().to_string()),
            last_name: req.last_name.map(|s| s.trim().to_string()),
        }
    }
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserView>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let user = create_account(&state, req).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<UserView>> {
    let user = find_user(&state, id).await?;
    Ok(Json(UserView::from(&user)))
}

pub async fn replace_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ReplaceUserRequest>,
) -> ApiResult<Json<UserView>> {
    apply_update(&state, &auth, id, req.into()).await
}

pub async fn patch_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
    ValidatedJson(req): ValidatedJson<PatchUserRequest>,
) -> ApiResult<Json<UserView>> {
    reject_blank(&[
        ("username", req.username.as_deref()),
        ("first_name", req.first_name.as_deref()),
        ("last_name", req.last_name.as_deref()),
    ])?;
    apply_update(&state, &auth, id, req.into()).await
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<StatusCode> {
    find_user(&state, id).await?;
    require_self(&auth, id)?;

    User::delete(&state.db, id).await?;
    info!(user_id = %id, "Deleted user");

    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    data: UpdateUser,
) -> ApiResult<Json<UserView>> {
    find_user(state, id).await?;
    require_self(auth, id)?;

    let user = User::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserView::from(&user)))
}
