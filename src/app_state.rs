use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::session::SessionStore;
use crate::services::{
    assets::AssetUploader,
    describe::DescriptionClient,
    detection::{DetectionClient, PollPolicy},
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub detection: Arc<DetectionClient>,
    pub description: Arc<DescriptionClient>,
    pub sessions: Arc<SessionStore>,
    pub output_dir: Arc<PathBuf>,
    pub api_key_configured: bool,
}

impl AppState {
    pub fn new(
        detection: DetectionClient,
        description: DescriptionClient,
        output_dir: PathBuf,
        api_key_configured: bool,
    ) -> Self {
        Self {
            detection: Arc::new(detection),
            description: Arc::new(description),
            sessions: Arc::new(SessionStore::new()),
            output_dir: Arc::new(output_dir),
            api_key_configured,
        }
    }

    /// Wire both NVCF clients from configuration over one HTTP connection pool.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let assets = AssetUploader::new(
            http.clone(),
            &config.assets_url,
            &config.nvidia_api_key,
            config.upload_timeout(),
        );

        let detection = DetectionClient::new(
            http.clone(),
            &config.detection_url,
            &config.polling_url,
            &config.nvidia_api_key,
            config.detection_threshold,
            PollPolicy {
                max_retries: config.max_poll_retries,
                delay: config.poll_delay(),
            },
            assets,
        );

        let description = DescriptionClient::new(
            http,
            &config.describe_url,
            &config.nvidia_api_key,
            config.describe_stream,
        );

        Ok(Self::new(
            detection,
            description,
            config.output_dir.clone(),
            !config.nvidia_api_key.trim().is_empty(),
        ))
    }
}
