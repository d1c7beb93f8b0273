//! # Taskboard API Server Library
//!
//! HTTP/JSON API for users, projects, project memberships, tasks and
//! comments. Every resource except registration, login, token refresh and
//! the health check requires a bearer access token, and callers only ever
//! see projects they own or belong to.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated JSON extractor
//! - `middleware`: Security headers
//! - `routes`: API route handlers
//! - `views`: Nested response views

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod views;
