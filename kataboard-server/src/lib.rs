//! kataboard-server: coding challenge catalog with support conversations
//!
//! Serves the challenge catalog and the support threads attached to it over
//! a JSON HTTP API, backed by SQLite.

pub mod db;
pub mod http;
pub mod models;
pub mod seed;

pub use http::{build_router, run_server, ApiError, AppState, ServerConfig};
