use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::models::asset::{AssetId, AssetRegistration, AssetUploadTicket};

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Two-phase NVCF asset upload: register, then PUT to the pre-signed URL.
#[derive(Clone)]
pub struct AssetUploader {
    http: Client,
    assets_url: String,
    api_key: String,
    upload_timeout: Duration,
}

impl AssetUploader {
    pub fn new(
        http: Client,
        assets_url: impl Into<String>,
        api_key: impl Into<String>,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            http,
            assets_url: assets_url.into(),
            api_key: api_key.into(),
            upload_timeout,
        }
    }

    /// Stage `bytes` as an NVCF asset and return its id.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        description: &str,
    ) -> Result<AssetId, AssetError> {
        let ticket = self.register(content_type, description).await?;
        debug!(asset_id = %ticket.asset_id, "Asset registered, uploading bytes");

        let response = self
            .http
            .put(&ticket.upload_url)
            .header("x-amz-meta-nvcf-asset-description", description)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .timeout(self.upload_timeout)
            .body(bytes)
            .send()
            .await
            .map_err(AssetError::TransferFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Transfer { status });
        }

        let asset_id: AssetId = ticket.asset_id.parse()?;
        info!(asset_id = %asset_id, "Asset uploaded");
        Ok(asset_id)
    }

    async fn register(
        &self,
        content_type: &str,
        description: &str,
    ) -> Result<AssetUploadTicket, AssetError> {
        let response = self
            .http
            .post(&self.assets_url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&AssetRegistration {
                content_type,
                description,
            })
            .timeout(REGISTRATION_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Registration { status });
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset registration rejected with status {status}")]
    Registration { status: StatusCode },

    #[error("Asset upload rejected with status {status}")]
    Transfer { status: StatusCode },

    #[error("Asset upload did not complete: {0}")]
    TransferFailed(reqwest::Error),

    #[error("Server returned an asset id that is not a UUID: {0}")]
    MalformedAssetId(#[from] uuid::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AssetError {
    /// Transfer failures cover both rejected PUTs and PUTs that never completed.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. } | Self::TransferFailed(_))
    }
}
