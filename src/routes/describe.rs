use axum::extract::{Multipart, Path, State};
use axum::Json;
use base64::Engine;
use garde::Validate;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::DescribeQueryRequest;
use crate::models::description::{Description, DescriptionQuery};
use crate::routes::error::ApiError;
use crate::routes::upload::{missing_image, read_upload_form};

/// POST /api/v1/sessions/{id}/describe — ask NeVA a question about an image.
///
/// Multipart fields: `query` and an optional `image`. Without an image the
/// question is asked about the session's last detected input image.
pub async fn describe_image(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Description>, ApiError> {
    if !state.sessions.contains(session_id).await {
        return Err(ApiError::SessionNotFound(session_id));
    }

    let form = read_upload_form(multipart, "query").await?;
    let request = DescribeQueryRequest {
        query: form.text.unwrap_or_default(),
    };
    request
        .validate()
        .map_err(|_| ApiError::BadRequest("Please enter a query for the model.".to_string()))?;

    let (bytes, file_name) = match form.image {
        Some(upload) => (upload.bytes, upload.file_name),
        None => {
            let cached = state
                .sessions
                .cached_image(session_id)
                .await
                .ok_or_else(missing_image)?;
            (cached.bytes, cached.file_name)
        }
    };

    let query = DescriptionQuery::new(
        base64::engine::general_purpose::STANDARD.encode(&bytes),
        request.query,
    );

    // Cancelled when the client disconnects and this future is dropped.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    tracing::info!(session_id = %session_id, file = %file_name, "Describing image");
    let description = state.description.describe(&query, &cancel).await?;

    Ok(Json(description))
}
