use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::services::artifact::ArtifactError;
use crate::services::describe::DescribeError;
use crate::services::detection::DetectionError;

/// Error returned by route handlers, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Only JPEG and PNG images are supported")]
    UnsupportedMediaType,

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Describe(#[from] DescribeError),

    #[error("Failed to read result image: {0}")]
    ResultUnreadable(#[from] std::io::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Detection(e) => match e {
                DetectionError::PollExhausted { .. } => StatusCode::GATEWAY_TIMEOUT,
                DetectionError::Artifact(ArtifactError::Io(_)) | DetectionError::State(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Describe(DescribeError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Describe(_) => StatusCode::BAD_GATEWAY,
            Self::ResultUnreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
