use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{HistoryResponse, SessionResponse};
use crate::routes::error::ApiError;

/// POST /api/v1/sessions — start a session with an empty history.
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let session = state.sessions.create().await;
    tracing::info!(session_id = %session.id, "Session created");

    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id,
            created_at: session.created_at,
        }),
    )
}

/// DELETE /api/v1/sessions/{id} — end a session and drop its history.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.remove(session_id).await {
        return Err(ApiError::SessionNotFound(session_id));
    }
    tracing::info!(session_id = %session_id, "Session ended");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/{id}/history
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let entries = state
        .sessions
        .history(session_id)
        .await
        .ok_or(ApiError::SessionNotFound(session_id))?;

    Ok(Json(HistoryResponse {
        session_id,
        entries,
    }))
}
