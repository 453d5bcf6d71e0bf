use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::models::asset::AssetId;
use crate::models::detection::{DetectionOutcome, DetectionRequest, SubmitOutcome};
use crate::models::job::{DetectionJob, DetectionStatus, InvalidTransition};
use crate::services::artifact::{self, ArtifactError};
use crate::services::assets::{AssetError, AssetUploader};

/// Response header carrying the poll token on a 202.
pub const REQUEST_ID_HEADER: &str = "NVCF-REQID";

/// Description attached to every staged input image.
pub const INPUT_ASSET_DESCRIPTION: &str = "Input Image";

/// Polling budget for a pending job.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

/// Client for the Grounding DINO function on NVCF.
#[derive(Clone)]
pub struct DetectionClient {
    http: Client,
    detection_url: String,
    polling_url: String,
    api_key: String,
    threshold: f64,
    poll: PollPolicy,
    assets: AssetUploader,
}

impl DetectionClient {
    pub fn new(
        http: Client,
        detection_url: impl Into<String>,
        polling_url: impl Into<String>,
        api_key: impl Into<String>,
        threshold: f64,
        poll: PollPolicy,
        assets: AssetUploader,
    ) -> Self {
        Self {
            http,
            detection_url: detection_url.into(),
            polling_url: polling_url.into(),
            api_key: api_key.into(),
            threshold,
            poll,
            assets,
        }
    }

    /// Submit a detection request for an already-uploaded asset.
    ///
    /// A 200 carries the artifact bundle, a 202 carries a poll token in
    /// `NVCF-REQID`. Anything else is returned as a submission error and is
    /// not retried.
    pub async fn submit(
        &self,
        prompt: &str,
        asset_id: &AssetId,
        threshold: f64,
    ) -> Result<SubmitOutcome, DetectionError> {
        let asset_list = asset_id.to_string();
        let response = self
            .http
            .post(&self.detection_url)
            .bearer_auth(&self.api_key)
            .header("NVCF-INPUT-ASSET-REFERENCES", &asset_list)
            .header("NVCF-FUNCTION-ASSET-IDS", &asset_list)
            .json(&DetectionRequest::new(prompt, asset_id, threshold))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(SubmitOutcome::Ready(response.bytes().await?)),
            StatusCode::ACCEPTED => {
                let poll_token = response
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or(DetectionError::MissingRequestId)?;
                Ok(SubmitOutcome::Pending { poll_token })
            }
            status => Err(DetectionError::Submission { status }),
        }
    }

    /// Poll the status endpoint until the job is ready.
    ///
    /// Each 202 consumes one retry and, unless the budget is spent, sleeps
    /// `delay`. A 200 returns the bundle; any other status fails at once.
    /// With N 202s before the 200 at most N + 1 requests are made.
    pub async fn poll_until_ready(
        &self,
        poll_token: &str,
        policy: PollPolicy,
    ) -> Result<Bytes, DetectionError> {
        let poll_url = format!("{}{}", self.polling_url, poll_token);
        let mut retries = policy.max_retries;
        let mut attempts = 0u32;

        while retries > 0 {
            attempts += 1;
            metrics::counter!("detection_poll_attempts").increment(1);

            let response = self
                .http
                .get(&poll_url)
                .bearer_auth(&self.api_key)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            match response.status() {
                StatusCode::ACCEPTED => {
                    debug!(poll_token, attempt = attempts, "Result is not yet ready");
                    retries -= 1;
                    if retries > 0 {
                        sleep(policy.delay).await;
                    }
                }
                StatusCode::OK => {
                    debug!(poll_token, attempt = attempts, "Result ready");
                    return Ok(response.bytes().await?);
                }
                status => return Err(DetectionError::PollFailed { status }),
            }
        }

        Err(DetectionError::PollExhausted { attempts })
    }

    /// Upload `image`, run detection for `prompt` and unpack the annotated
    /// image into a per-job directory under `output_dir`.
    pub async fn detect(
        &self,
        image: Vec<u8>,
        content_type: &str,
        prompt: &str,
        output_dir: &Path,
    ) -> Result<DetectionOutcome, DetectionError> {
        let start = Instant::now();
        metrics::counter!("detection_jobs_total").increment(1);

        let asset_id = self
            .assets
            .upload(image, content_type, INPUT_ASSET_DESCRIPTION)
            .await
            .inspect_err(|_| {
                metrics::counter!("detection_jobs_failed").increment(1);
            })?;

        let mut job = DetectionJob::new(prompt, asset_id, self.threshold);
        info!(job_id = %job.id, asset_id = %asset_id, "Submitting detection job");

        match self.run_job(&mut job, output_dir).await {
            Ok(outcome) => {
                metrics::counter!("detection_jobs_completed").increment(1);
                metrics::histogram!("detection_processing_seconds")
                    .record(start.elapsed().as_secs_f64());
                info!(
                    job_id = %job.id,
                    image = %outcome.image_path.display(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Detection complete"
                );
                Ok(outcome)
            }
            Err(e) => {
                metrics::counter!("detection_jobs_failed").increment(1);
                // Unpack failures happen after Ready, which stays terminal.
                if !job.status.is_terminal() {
                    job.mark_failed(e.to_string()).ok();
                }
                warn!(job_id = %job.id, status = %job.status, error = %e, "Detection failed");
                Err(e)
            }
        }
    }

    async fn run_job(
        &self,
        job: &mut DetectionJob,
        output_dir: &Path,
    ) -> Result<DetectionOutcome, DetectionError> {
        let archive = match self.submit(&job.prompt, &job.asset_id, job.threshold).await? {
            SubmitOutcome::Ready(bytes) => bytes,
            SubmitOutcome::Pending { poll_token } => {
                info!(job_id = %job.id, poll_token = %poll_token, "Pending evaluation");
                job.mark_pending(poll_token.clone())?;
                self.poll_until_ready(&poll_token, self.poll).await?
            }
        };
        job.transition(DetectionStatus::Ready)?;

        let job_dir = output_dir.join(job.id.to_string());
        let destination = job_dir.clone();
        let unpacked = tokio::task::spawn_blocking(move || artifact::unpack(&archive, &destination))
            .await
            .map_err(|e| ArtifactError::Io(std::io::Error::other(e)))?;

        let image_path = match unpacked {
            Ok(path) => path,
            Err(e) => {
                if let Err(cleanup) = artifact::discard(&job_dir).await {
                    warn!(job_id = %job.id, error = %cleanup, "Failed to remove job directory");
                }
                return Err(e.into());
            }
        };

        Ok(DetectionOutcome {
            job_id: job.id,
            status: job.status,
            job_dir,
            image_path,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Detection submission rejected with status {status}")]
    Submission { status: StatusCode },

    #[error("Detection accepted without an NVCF-REQID header")]
    MissingRequestId,

    #[error("Polling failed with unexpected status {status}")]
    PollFailed { status: StatusCode },

    #[error("Result still pending after {attempts} polling attempts")]
    PollExhausted { attempts: u32 },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    State(#[from] InvalidTransition),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
