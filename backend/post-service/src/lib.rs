/// Post Service Library
///
/// Posts, likes and comments for the DevConnector social network.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers under `/api/posts` plus health probes
/// - `models`: Post, Like, Comment and the authenticated Caller
/// - `services`: the post store (validation, ownership, atomic mutations)
/// - `db`: storage backends behind the `PostRepository` trait
/// - `middleware`: JWT authentication, request metrics, permission checks
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
