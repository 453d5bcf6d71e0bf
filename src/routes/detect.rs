use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::DetectRequest;
use crate::models::session::HistoryStatus;
use crate::routes::error::ApiError;
use crate::routes::upload::read_upload_form;
use crate::services::artifact;

/// POST /api/v1/sessions/{id}/detect — run Grounding DINO on an uploaded image.
///
/// Multipart fields: `image` (JPEG or PNG) and `prompt`. Responds with the
/// annotated image, records the outcome in the session history and caches the
/// input image for follow-up questions. The job's scratch directory is
/// removed once the result has been read.
pub async fn detect_objects(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    if !state.sessions.contains(session_id).await {
        return Err(ApiError::SessionNotFound(session_id));
    }

    let (upload, prompt) = read_upload_form(multipart, "prompt").await?.require_image()?;
    let request = DetectRequest {
        prompt: prompt.unwrap_or_default(),
    };
    request
        .validate()
        .map_err(|_| ApiError::BadRequest("Please enter a prompt for object detection.".to_string()))?;

    tracing::info!(
        session_id = %session_id,
        file = %upload.file_name,
        size = upload.bytes.len(),
        "Analyzing image"
    );

    let content_type = upload.content_type();
    let cached = upload.to_cached();
    let outcome = match state
        .detection
        .detect(upload.bytes, content_type, &request.prompt, &state.output_dir)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            state
                .sessions
                .record(session_id, upload.file_name, HistoryStatus::Failed)
                .await;
            return Err(e.into());
        }
    };

    let image = tokio::fs::read(&outcome.image_path).await;
    if let Err(e) = artifact::discard(&outcome.job_dir).await {
        tracing::warn!(job_id = %outcome.job_id, error = %e, "Failed to remove job directory");
    }
    let image = image?;

    state
        .sessions
        .record(session_id, outcome.file_name(), HistoryStatus::Done)
        .await;
    state.sessions.cache_image(session_id, cached).await;

    Ok((
        [
            (header::CONTENT_TYPE, artifact::content_type_for(&outcome.image_path).to_string()),
            (header::HeaderName::from_static("x-detection-job-id"), outcome.job_id.to_string()),
        ],
        image,
    ))
}
