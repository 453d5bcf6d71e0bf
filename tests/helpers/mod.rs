//! Mock NVCF endpoints for integration tests
//!
//! One axum server on an ephemeral port plays the asset registry, the
//! pre-signed upload target, the Grounding DINO function, the status endpoint
//! and the NeVA chat endpoint. Behaviour is fixed per server and every
//! endpoint counts its calls.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nim_vision::services::assets::AssetUploader;
use nim_vision::services::describe::DescriptionClient;
use nim_vision::services::detection::{DetectionClient, PollPolicy};

use crate::fixtures;

pub const API_KEY: &str = "nvapi-test-key";

/// Fixed responses of the mock server.
#[derive(Clone)]
pub struct MockBehavior {
    pub register_status: StatusCode,
    pub asset_id: String,
    pub upload_status: StatusCode,
    /// How long the pre-signed upload target stalls before answering.
    pub upload_delay: Duration,
    pub submit_status: StatusCode,
    pub send_request_id: bool,
    /// Number of 202s the status endpoint answers before `final_poll_status`.
    pub pending_polls: usize,
    pub final_poll_status: StatusCode,
    pub archive: Vec<u8>,
    pub describe_status: StatusCode,
    pub sse_body: String,
    pub json_document: Value,
    /// Non-streaming body sent verbatim instead of `json_document`.
    pub raw_document: Option<String>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            register_status: StatusCode::OK,
            asset_id: fixtures::ASSET_ID.to_string(),
            upload_status: StatusCode::OK,
            upload_delay: Duration::ZERO,
            submit_status: StatusCode::OK,
            send_request_id: true,
            pending_polls: 0,
            final_poll_status: StatusCode::OK,
            archive: fixtures::detection_bundle(),
            describe_status: StatusCode::OK,
            sse_body: fixtures::sse_body(&["Hel", "lo", " world"]),
            json_document: json!({
                "choices": [{ "message": { "role": "assistant", "content": "A red pixel." } }]
            }),
            raw_document: None,
        }
    }
}

impl MockBehavior {
    /// Submission answers 202 and the status endpoint 202s `pending` times.
    pub fn pending(pending_polls: usize) -> Self {
        Self {
            submit_status: StatusCode::ACCEPTED,
            pending_polls,
            ..Self::default()
        }
    }

    /// Submission answers 202 and the job never completes.
    pub fn never_ready() -> Self {
        Self::pending(usize::MAX)
    }
}

#[derive(Default)]
pub struct CallCounts {
    pub register: AtomicUsize,
    pub upload: AtomicUsize,
    pub submit: AtomicUsize,
    pub poll: AtomicUsize,
    pub describe: AtomicUsize,
}

/// Requests observed by the mock, for header and body assertions.
#[derive(Default)]
pub struct Recorded {
    pub registration: Option<Value>,
    pub upload_headers: Option<HeaderMap>,
    pub upload_body: Option<Vec<u8>>,
    pub submit_headers: Option<HeaderMap>,
    pub submit_body: Option<Value>,
    pub poll_tokens: Vec<String>,
    pub describe_headers: Option<HeaderMap>,
    pub describe_body: Option<Value>,
}

pub struct MockState {
    behavior: MockBehavior,
    base_url: String,
    pub calls: CallCounts,
    pub recorded: Mutex<Recorded>,
}

pub struct MockNvcf {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockNvcf {
    pub async fn start(behavior: MockBehavior) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock NVCF");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

        let state = Arc::new(MockState {
            behavior,
            base_url: base_url.clone(),
            calls: CallCounts::default(),
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/assets", post(register_asset))
            .route("/upload/{asset_id}", put(upload_asset))
            .route("/detect", post(submit_detection))
            .route("/status/{token}", get(poll_status))
            .route("/describe", post(describe))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock NVCF server");
        });

        Self { base_url, state }
    }

    pub fn assets_url(&self) -> String {
        format!("{}/assets", self.base_url)
    }

    pub fn detection_url(&self) -> String {
        format!("{}/detect", self.base_url)
    }

    pub fn polling_url(&self) -> String {
        format!("{}/status/", self.base_url)
    }

    pub fn describe_url(&self) -> String {
        format!("{}/describe", self.base_url)
    }

    pub fn registrations(&self) -> usize {
        self.state.calls.register.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.state.calls.upload.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.state.calls.submit.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.state.calls.poll.load(Ordering::SeqCst)
    }

    pub fn describes(&self) -> usize {
        self.state.calls.describe.load(Ordering::SeqCst)
    }

    pub fn uploader(&self) -> AssetUploader {
        self.uploader_with_timeout(Duration::from_secs(5))
    }

    pub fn uploader_with_timeout(&self, upload_timeout: Duration) -> AssetUploader {
        AssetUploader::new(reqwest::Client::new(), self.assets_url(), API_KEY, upload_timeout)
    }

    pub fn detection_client(&self, poll: PollPolicy) -> DetectionClient {
        DetectionClient::new(
            reqwest::Client::new(),
            self.detection_url(),
            self.polling_url(),
            API_KEY,
            0.3,
            poll,
            self.uploader(),
        )
    }

    pub fn description_client(&self, stream: bool) -> DescriptionClient {
        DescriptionClient::new(reqwest::Client::new(), self.describe_url(), API_KEY, stream)
    }
}

/// Polling policy that does not slow the test suite down.
pub fn fast_poll(max_retries: u32) -> PollPolicy {
    PollPolicy {
        max_retries,
        delay: Duration::from_millis(5),
    }
}

async fn register_asset(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.calls.register.fetch_add(1, Ordering::SeqCst);
    state.recorded.lock().unwrap().registration = Some(body);

    if !state.behavior.register_status.is_success() {
        return state.behavior.register_status.into_response();
    }

    Json(json!({
        "uploadUrl": format!("{}/upload/{}", state.base_url, state.behavior.asset_id),
        "assetId": state.behavior.asset_id,
    }))
    .into_response()
}

async fn upload_asset(
    State(state): State<Arc<MockState>>,
    Path(_asset_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.calls.upload.fetch_add(1, Ordering::SeqCst);
    if !state.behavior.upload_delay.is_zero() {
        tokio::time::sleep(state.behavior.upload_delay).await;
    }
    let mut recorded = state.recorded.lock().unwrap();
    recorded.upload_headers = Some(headers);
    recorded.upload_body = Some(body.to_vec());
    state.behavior.upload_status
}

async fn submit_detection(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.calls.submit.fetch_add(1, Ordering::SeqCst);
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.submit_headers = Some(headers);
        recorded.submit_body = Some(body);
    }

    match state.behavior.submit_status {
        StatusCode::OK => (StatusCode::OK, state.behavior.archive.clone()).into_response(),
        StatusCode::ACCEPTED if state.behavior.send_request_id => (
            StatusCode::ACCEPTED,
            [("NVCF-REQID", fixtures::REQUEST_ID)],
        )
            .into_response(),
        status => status.into_response(),
    }
}

async fn poll_status(State(state): State<Arc<MockState>>, Path(token): Path<String>) -> Response {
    let call = state.calls.poll.fetch_add(1, Ordering::SeqCst) + 1;
    state.recorded.lock().unwrap().poll_tokens.push(token);

    if call <= state.behavior.pending_polls {
        return StatusCode::ACCEPTED.into_response();
    }

    match state.behavior.final_poll_status {
        StatusCode::OK => (StatusCode::OK, state.behavior.archive.clone()).into_response(),
        status => status.into_response(),
    }
}

async fn describe(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.calls.describe.fetch_add(1, Ordering::SeqCst);
    let stream = body["stream"].as_bool().unwrap_or(false);
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.describe_headers = Some(headers);
        recorded.describe_body = Some(body);
    }

    if !state.behavior.describe_status.is_success() {
        return (state.behavior.describe_status, "Unauthorized").into_response();
    }

    if let Some(raw) = &state.behavior.raw_document {
        return ([(header::CONTENT_TYPE, "application/json")], raw.clone()).into_response();
    }

    if stream {
        (
            [(header::CONTENT_TYPE, "text/event-stream")],
            state.behavior.sse_body.clone(),
        )
            .into_response()
    } else {
        Json(state.behavior.json_document.clone()).into_response()
    }
}
