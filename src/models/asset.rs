use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of an image staged on NVCF for consumption by a detection job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Synthetic URL used to reference the asset from a chat message.
    pub fn media_url(&self) -> String {
        format!("data:image/jpeg;asset_id,{}", self.0)
    }
}

impl From<Uuid> for AssetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Body of the asset registration request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRegistration<'a> {
    pub content_type: &'a str,
    pub description: &'a str,
}

/// Registration response: a short-lived write URL and the asset id.
///
/// The id is kept as a string so a malformed value can be reported as such
/// rather than as a JSON decoding failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUploadTicket {
    pub upload_url: String,
    pub asset_id: String,
}
