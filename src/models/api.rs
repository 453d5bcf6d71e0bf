use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::session::HistoryEntry;

/// Text fields of a detection upload (the image travels as a separate part).
#[derive(Debug, Deserialize, Validate)]
pub struct DetectRequest {
    #[garde(length(min = 1, max = 1000))]
    pub prompt: String,
}

/// Text fields of a description upload.
#[derive(Debug, Deserialize, Validate)]
pub struct DescribeQueryRequest {
    #[garde(length(min = 1, max = 2000))]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub entries: Vec<HistoryEntry>,
}
