use bytes::Bytes;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::asset::AssetId;
use crate::models::job::DetectionStatus;

pub const DETECTION_MODEL: &str = "Grounding-Dino";

/// Grounding DINO invocation body.
#[derive(Debug, Serialize)]
pub struct DetectionRequest {
    pub model: &'static str,
    pub messages: Vec<DetectionMessage>,
    pub threshold: f64,
}

#[derive(Debug, Serialize)]
pub struct DetectionMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    MediaUrl { media_url: MediaUrl },
}

#[derive(Debug, Serialize)]
pub struct MediaUrl {
    pub url: String,
}

impl DetectionRequest {
    pub fn new(prompt: &str, asset_id: &AssetId, threshold: f64) -> Self {
        Self {
            model: DETECTION_MODEL,
            messages: vec![DetectionMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::MediaUrl {
                        media_url: MediaUrl {
                            url: asset_id.media_url(),
                        },
                    },
                ],
            }],
            threshold,
        }
    }
}

/// Immediate outcome of a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// HTTP 200: the body is the artifact bundle.
    Ready(Bytes),
    /// HTTP 202: poll with this token.
    Pending { poll_token: String },
}

/// Result of a full upload → submit → poll → unpack run.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub job_id: Uuid,
    pub status: DetectionStatus,
    /// Scratch directory holding the extracted bundle.
    pub job_dir: PathBuf,
    pub image_path: PathBuf,
}

impl DetectionOutcome {
    pub fn file_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
