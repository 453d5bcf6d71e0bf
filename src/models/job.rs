use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::asset::AssetId;

/// Default Grounding DINO box confidence threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Status of a detection job on NVCF.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectionStatus {
    Submitted,
    Pending,
    Ready,
    Failed,
}

impl DetectionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Submitted -> {Ready, Pending}, Pending -> {Ready, Failed},
    /// and any non-terminal state may fail.
    pub fn can_transition_to(self, next: DetectionStatus) -> bool {
        use DetectionStatus::*;
        match (self, next) {
            (Submitted, Ready | Pending) => true,
            (Pending, Ready) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("illegal detection job transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: DetectionStatus,
    pub to: DetectionStatus,
}

/// One detection request and where it is in its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionJob {
    pub id: Uuid,
    pub prompt: String,
    pub asset_id: AssetId,
    pub threshold: f64,
    pub status: DetectionStatus,
    /// `NVCF-REQID` returned with a 202, once the job is pending.
    pub poll_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl DetectionJob {
    pub fn new(prompt: impl Into<String>, asset_id: AssetId, threshold: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            asset_id,
            threshold,
            status: DetectionStatus::Submitted,
            poll_token: None,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    pub fn transition(&mut self, next: DetectionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_pending(&mut self, poll_token: String) -> Result<(), InvalidTransition> {
        self.transition(DetectionStatus::Pending)?;
        self.poll_token = Some(poll_token);
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(DetectionStatus::Failed)?;
        self.error = Some(reason.into());
        Ok(())
    }
}
