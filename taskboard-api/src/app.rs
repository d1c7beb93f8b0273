/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::{jwt::TokenSettings, middleware::jwt_auth_middleware};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Secret and lifetimes used to issue tokens
    pub fn token_settings(&self) -> TokenSettings {
        self.config.jwt.token_settings()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                           # Health check (public)
/// └── /api/
///     ├── POST /users/register/             # public
///     ├── POST /users/login/                # public
///     ├── POST /users/token/refresh/        # public
///     ├── /users/            GET POST
///     ├── /users/:id/        GET PUT PATCH DELETE
///     ├── /projects/         GET POST
///     ├── /projects/:id/     GET PUT PATCH DELETE
///     ├── /projects/:id/tasks/                   GET
///     ├── /projects/:id/members/                 GET POST
///     ├── /projects/:id/members/:member_id/      PATCH DELETE
///     ├── /tasks/            GET POST
///     ├── /tasks/:id/        GET PUT PATCH DELETE
///     ├── /tasks/:id/comments/                   GET
///     ├── /comments/         GET POST
///     └── /comments/:id/     GET PUT PATCH DELETE
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Bearer token authentication (everything except the public routes)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/users/register/", post(routes::auth::register))
        .route("/users/login/", post(routes::auth::login))
        .route("/users/token/refresh/", post(routes::auth::refresh));

    let pool = state.db.clone();
    let secret = state.config.jwt.secret.clone();

    let protected_routes = Router::new()
        .route(
            "/users/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:id/",
            get(routes::users::get_user)
                .put(routes::users::replace_user)
                .patch(routes::users::patch_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/projects/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id/",
            get(routes::projects::get_project)
                .put(routes::projects::replace_project)
                .patch(routes::projects::patch_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/:id/tasks/", get(routes::projects::project_tasks))
        .route(
            "/projects/:id/members/",
            get(routes::members::list_members).post(routes::members::add_member),
        )
        .route(
            "/projects/:id/members/:member_id/",
            patch(routes::members::update_member).delete(routes::members::remove_member),
        )
        .route(
            "/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id/",
            get(routes::tasks::get_task)
                .put(routes::tasks::replace_task)
                .patch(routes::tasks::patch_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/comments/", get(routes::tasks::task_comments))
        .route(
            "/comments/",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/comments/:id/",
            get(routes::comments::get_comment)
                .put(routes::comments::replace_comment)
                .patch(routes::comments::patch_comment)
                .delete(routes::comments::delete_comment),
        )
        // route_layer: unknown paths still 404 instead of 401
        .route_layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            jwt_auth_middleware(pool.clone(), secret.clone(), req, next)
        }));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}
