use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub api_key: ComponentHealth,
    pub output_dir: ComponentHealth,
    pub active_sessions: usize,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

impl ComponentHealth {
    fn from_ok(ok: bool) -> Self {
        Self {
            status: if ok { "ok" } else { "error" }.to_string(),
        }
    }
}

/// GET /health — liveness plus local configuration checks.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let api_key = ComponentHealth::from_ok(state.api_key_configured);
    let output_dir = ComponentHealth::from_ok(
        tokio::fs::create_dir_all(state.output_dir.as_path()).await.is_ok(),
    );

    let all_healthy = api_key.status == "ok" && output_dir.status == "ok";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            api_key,
            output_dir,
            active_sessions: state.sessions.len().await,
        },
    };

    (status_code, Json(response))
}
