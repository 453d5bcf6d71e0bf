use axum::routing::{delete, get, post};
use axum::Router;

use crate::app_state::AppState;

pub mod describe;
pub mod detect;
pub mod error;
pub mod health;
pub mod metrics;
pub mod sessions;
pub mod upload;

/// API routes, without the metrics endpoint or middleware layers.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/sessions", post(sessions::create_session))
        .route("/api/v1/sessions/{id}", delete(sessions::end_session))
        .route("/api/v1/sessions/{id}/history", get(sessions::get_history))
        .route("/api/v1/sessions/{id}/detect", post(detect::detect_objects))
        .route("/api/v1/sessions/{id}/describe", post(describe::describe_image))
        .with_state(state)
}
