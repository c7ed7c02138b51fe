/// Blog Service Library
///
/// REST API for a blogging platform: posts, groups, comments nested under
/// posts, and follow relationships between users.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `services`: request pipelines (resolve, authorize, validate, persist)
/// - `serializers`: wire formats and input validation
/// - `db`: the `Store` trait with PostgreSQL and in-process implementations
/// - `identity`: bearer token to `Caller` resolution
/// - `middleware`: identity and metrics middleware, ownership checks
/// - `pagination` / `filters`: limit-offset windows, group filter, follow search
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod serializers;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
