//! HTTP boundary — thin axum wrapper around the spam gate and pipeline.

pub mod routes;

pub use routes::{AppState, service_routes};
