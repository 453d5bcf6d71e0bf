use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::job::DEFAULT_THRESHOLD;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// NVIDIA API key, sent as a bearer token to every NVCF endpoint
    pub nvidia_api_key: String,

    /// Asset registration endpoint
    #[serde(default = "default_assets_url")]
    pub assets_url: String,

    /// Grounding DINO invocation endpoint
    #[serde(default = "default_detection_url")]
    pub detection_url: String,

    /// Status endpoint; the poll token is appended to this URL
    #[serde(default = "default_polling_url")]
    pub polling_url: String,

    /// NeVA-22B chat endpoint
    #[serde(default = "default_describe_url")]
    pub describe_url: String,

    /// Scratch directory for downloaded and extracted artifact bundles
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_max_poll_retries")]
    pub max_poll_retries: u32,

    #[serde(default = "default_poll_delay_secs")]
    pub poll_delay_secs: u64,

    /// Timeout for the PUT of asset bytes to the pre-signed upload URL
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f64,

    /// Request `text/event-stream` from the description endpoint
    #[serde(default = "default_describe_stream")]
    pub describe_stream: bool,

    /// Request body limit for image uploads to this server
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_assets_url() -> String {
    "https://api.nvcf.nvidia.com/v2/nvcf/assets".to_string()
}

fn default_detection_url() -> String {
    "https://ai.api.nvidia.com/v1/cv/nvidia/nv-grounding-dino".to_string()
}

fn default_polling_url() -> String {
    "https://api.nvcf.nvidia.com/v2/nvcf/pexec/status/".to_string()
}

fn default_describe_url() -> String {
    "https://ai.api.nvidia.com/v1/vlm/nvidia/neva-22b".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_poll_retries() -> u32 {
    5
}

fn default_poll_delay_secs() -> u64 {
    1
}

fn default_upload_timeout_secs() -> u64 {
    300
}

fn default_detection_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_describe_stream() -> bool {
    true
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}
