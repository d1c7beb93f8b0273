/// Bearer token authentication for Axum
///
/// Extracts the access token from `Authorization: Bearer <token>`, validates
/// it, and loads the user it names. Tokens whose user was deleted or
/// deactivated after issue are rejected, so a stolen token stops working as
/// soon as the account does.
///
/// # Request Extensions
///
/// After successful authentication the middleware adds an [`AuthContext`].
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware, middleware::Next, routing::get, Extension, Router};
/// use sqlx::PgPool;
/// use taskboard_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.user_id.to_string()
/// }
///
/// fn router(pool: PgPool, secret: String) -> Router {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .layer(middleware::from_fn(move |req: Request, next: Next| {
///             jwt_auth_middleware(pool.clone(), secret.clone(), req, next)
///         }))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::User;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but the user no longer exists or is disabled
    #[error("User not found or inactive")]
    UserInactive,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match &self {
            AuthError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error during authentication");
                ("internal_error", "An internal error occurred".to_string())
            }
            other => ("unauthorized", other.to_string()),
        };

        (
            status,
            Json(serde_json::json!({ "error": error, "message": message })),
        )
            .into_response()
    }
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates the bearer token and checks the user is still active
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] / [`AuthError::InvalidFormat`] for a
///   missing or malformed header
/// - [`AuthError::InvalidToken`] for bad signature, expiry, issuer, or a
///   refresh token used as an access token
/// - [`AuthError::UserInactive`] when the subject was deleted or disabled
pub async fn authenticate(
    pool: &PgPool,
    headers: &HeaderMap,
    secret: &str,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;

    let user = User::find_by_id(pool, claims.sub).await?;
    match user {
        Some(user) if user.is_active => Ok(AuthContext::new(user.id)),
        _ => {
            tracing::debug!(user_id = %claims.sub, "Rejected token for missing or inactive user");
            Err(AuthError::UserInactive)
        }
    }
}

/// JWT authentication middleware
///
/// Returns 401 with a JSON error body when [`authenticate`] fails.
pub async fn jwt_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = authenticate(&pool, req.headers(), &secret).await?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
