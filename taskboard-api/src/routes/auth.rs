/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/users/register/` - Register a new user and get tokens
/// - `POST /api/users/login/` - Login and get tokens
/// - `POST /api/users/token/refresh/` - Exchange a refresh token for an access token
///
/// All three are public.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, NON_FIELD_ERRORS},
    extract::{not_blank, ValidatedJson},
    views::UserView,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password},
    models::user::{normalize_email, CreateUser, User},
};
use tracing::{debug, info};
use validator::Validate;

/// Register request, also accepted by `POST /api/users/`
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has no more than 150 characters."),
        custom(function = "not_blank")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    /// Checked against the password policy after validation
    pub password: String,

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

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank"))]
    pub email: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,

    pub refresh: String,

    pub access: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub refresh: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Creates a user from a validated registration payload
///
/// Applies the password policy, hashes the password and normalizes the
/// email. Duplicate emails and usernames surface as validation errors via
/// the table's unique constraints.
pub(crate) async fn create_account(state: &AppState, req: RegisterRequest) -> ApiResult<User> {
    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::validation("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
        },
    )
    .await?;

    info!(user_id = %user.id, "Registered user");
    Ok(user)
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/users/register/
/// Content-Type: application/json
///
/// {
///   "username": "ada",
///   "email": "ada@example.com",
///   "password": "analytical-engine",
///   "first_name": "Ada",
///   "last_name": "Lovelace"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "user": {"id": "uuid", "username": "ada", ...},
///   "refresh": "eyJ...",
///   "access": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or email/username already taken
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let user = create_account(&state, req).await?;
    let tokens = jwt::issue_token_pair(user.id, &state.token_settings())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserView::from(&user),
            refresh: tokens.refresh,
            access: tokens.access,
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/users/login/
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "analytical-engine"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: "Invalid credentials" for an unknown email or wrong
///   password, "User account is disabled" for an inactive user
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::validation(NON_FIELD_ERRORS, "Invalid credentials");

    let Some(user) = User::find_by_email(&state.db, &normalize_email(&req.email)).await? else {
        password::verify_dummy(&req.password);
        debug!("Login failed: unknown email");
        return Err(invalid());
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::validation(NON_FIELD_ERRORS, "User account is disabled"));
    }

    User::update_last_login(&state.db, user.id).await?;
    let tokens = jwt::issue_token_pair(user.id, &state.token_settings())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: UserView::from(&user),
        refresh: tokens.refresh,
        access: tokens.access,
    }))
}

/// Token refresh endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/users/token/refresh/
/// Content-Type: application/json
///
/// {"refresh": "eyJ..."}
/// ```
///
/// # Response
///
/// ```json
/// {"access": "eyJ..."}
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or the user is
///   gone or disabled
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let (access, claims) = jwt::refresh_access_token(&req.refresh, &state.token_settings())?;

    match User::find_by_id(&state.db, claims.sub).await? {
        Some(user) if user.is_active => Ok(Json(RefreshResponse { access })),
        _ => Err(ApiError::Unauthorized("User not found or inactive".to_string())),
    }
}
