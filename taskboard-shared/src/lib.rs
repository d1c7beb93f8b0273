//! # Taskboard Shared Library
//!
//! Data layer and authentication primitives used by the Taskboard API
//! server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and migrations
//! - `models`: database models and queries
//! - `auth`: password hashing, JWT tokens, request authentication and the
//!   access policy

pub mod auth;
pub mod db;
pub mod models;
