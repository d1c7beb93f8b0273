/// Integration tests for registration, login and token handling
///
/// Requires a running PostgreSQL database (see `common`).

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, PASSWORD};
use serde_json::json;
use taskboard_shared::auth::jwt::{issue_token_pair, TokenSettings};
use taskboard_shared::models::user::User;
use uuid::Uuid;

#[tokio::test]
async fn test_register_returns_user_and_tokens() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("reg").await;

    // Tokens are immediately usable
    let (status, body) = ctx.get(&format!("/api/users/{}/", user.id), &user.access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["username"], user.username.as_str());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_register_duplicate_email_fails() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("dup").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/register/",
            None,
            Some(json!({
                "username": format!("other_{}", &Uuid::new_v4().simple().to_string()[..8]),
                "email": user.email,
                "password": PASSWORD,
                "first_name": "Other",
                "last_name": "User",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_register_duplicate_username_fails() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("dupname").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/register/",
            None,
            Some(json!({
                "username": user.username,
                "email": format!("{}@example.com", Uuid::new_v4()),
                "password": PASSWORD,
                "first_name": "Other",
                "last_name": "User",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "username");

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new().await.unwrap();

    // Missing fields
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/register/",
            None,
            Some(json!({"email": "someone@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Numeric password
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/register/",
            None,
            Some(json!({
                "username": "numeric_pw",
                "email": format!("{}@example.com", Uuid::new_v4()),
                "password": "1234567890",
                "first_name": "N",
                "last_name": "P",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_success_updates_last_login() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("login").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/login/",
            None,
            Some(json!({"email": user.email, "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());

    let stored = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_login_email_domain_is_case_insensitive() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("case").await;

    let shouted = user.email.replace("@example.com", "@EXAMPLE.COM");
    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/users/login/",
            None,
            Some(json!({"email": shouted, "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("wrongpw").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/login/",
            None,
            Some(json!({"email": user.email, "password": "not-the-password"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    // Unknown email gives the same answer
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/login/",
            None,
            Some(json!({"email": "nobody-here@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_inactive_user_cannot_login_or_use_tokens() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("inactive").await;

    User::set_active(&ctx.db, user.id, false).await.unwrap();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/login/",
            None,
            Some(json!({"email": user.email, "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User account is disabled");

    // Previously issued tokens stop working
    let (status, _) = ctx.get("/api/projects/", &user.access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/users/token/refresh/",
            None,
            Some(json!({"refresh": user.refresh})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_401() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send(Method::GET, "/api/projects/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("/api/tasks/", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed with another secret
    let forged = issue_token_pair(
        Uuid::new_v4(),
        &TokenSettings::new("some-completely-different-secret-value"),
    )
    .unwrap();
    let (status, _) = ctx.get("/api/comments/", &forged.access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_401() {
    let ctx = TestContext::new().await.unwrap();

    // Valid signature, but the subject never existed
    let pair = issue_token_pair(Uuid::new_v4(), &ctx.config.jwt.token_settings()).unwrap();
    let (status, _) = ctx.get("/api/projects/", &pair.access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("refresh").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/token/refresh/",
            None,
            Some(json!({"refresh": user.refresh})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let access = body["access"].as_str().unwrap();
    let (status, _) = ctx.get("/api/projects/", access).await;
    assert_eq!(status, StatusCode::OK);

    // A refresh token is not an access token, and vice versa
    let (status, _) = ctx.get("/api/projects/", &user.refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/users/token/refresh/",
            None,
            Some(json!({"refresh": user.access})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[&user]).await;
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}
