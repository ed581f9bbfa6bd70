//! Axum HTTP API for deepfake video analysis.
//!
//! - `POST /`: analyze an uploaded video (multipart `user_id` + `video`)
//! - `GET /get-result/:analysis_id`: fetch a stored analysis
//! - Liveness, readiness and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
