//! NeVA image description client.
//!
//! In streaming mode the endpoint answers with server-sent events, one JSON
//! completion chunk per `data: ` line. The answer is the concatenation of every
//! chunk's `choices[0].delta.content` in arrival order.

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::description::{DescribeRequest, Description, DescriptionQuery, StreamChunk};

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Client for the NeVA-22B vision-language endpoint.
#[derive(Clone)]
pub struct DescriptionClient {
    http: Client,
    describe_url: String,
    api_key: String,
    stream: bool,
}

impl DescriptionClient {
    pub fn new(
        http: Client,
        describe_url: impl Into<String>,
        api_key: impl Into<String>,
        stream: bool,
    ) -> Self {
        Self {
            http,
            describe_url: describe_url.into(),
            api_key: api_key.into(),
            stream,
        }
    }

    /// Ask `query` about the base64-encoded image.
    ///
    /// Transport failures are returned as-is; there is no retry.
    pub async fn describe(
        &self,
        query: &DescriptionQuery,
        cancel: &CancellationToken,
    ) -> Result<Description, DescribeError> {
        metrics::counter!("describe_requests_total").increment(1);

        let accept = if self.stream {
            "text/event-stream"
        } else {
            "application/json"
        };

        let request = self
            .http
            .post(&self.describe_url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, accept)
            .json(&DescribeRequest::new(query, self.stream))
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DescribeError::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DescribeError::Status { status, body });
        }

        if self.stream {
            let text = assemble_stream(response.bytes_stream(), cancel).await?;
            Ok(Description::Accumulated { text })
        } else {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DescribeError::Cancelled),
                body = response.bytes() => body?,
            };
            let document = serde_json::from_slice(&body)?;
            Ok(Description::RawDocument { document })
        }
    }
}

/// Assemble the text of a server-sent event stream.
///
/// Lines without the `data: ` marker are ignored. Chunks that are not valid
/// JSON are skipped with a warning. `data: [DONE]` ends the stream early.
pub async fn assemble_stream<S, E>(
    stream: S,
    cancel: &CancellationToken,
) -> Result<String, DescribeError>
where
    S: Stream<Item = Result<Bytes, E>>,
    DescribeError: From<E>,
{
    let mut stream = std::pin::pin!(stream);
    let mut buf = BytesMut::new();
    let mut result = String::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DescribeError::Cancelled),
            next = stream.next() => next,
        };

        match next {
            Some(chunk) => buf.extend_from_slice(&chunk?),
            None => break,
        }

        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line = buf.split_to(pos + 1);
            if let LineOutcome::Done = handle_line(&line, &mut result) {
                return Ok(result);
            }
        }
    }

    // A final event without a trailing newline.
    if !buf.is_empty() {
        handle_line(&buf, &mut result);
    }

    Ok(result)
}

enum LineOutcome {
    Continue,
    Done,
}

fn handle_line(raw: &[u8], result: &mut String) -> LineOutcome {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Continue;
    };

    if data.trim() == DONE_MARKER {
        return LineOutcome::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            if let Some(content) = chunk.content() {
                result.push_str(content);
            }
        }
        Err(e) => {
            metrics::counter!("describe_stream_decode_warnings_total").increment(1);
            warn!(error = %e, chunk = data, "Skipping malformed stream chunk");
        }
    }
    debug!(accumulated = result.len(), "Processed stream chunk");

    LineOutcome::Continue
}

#[derive(Debug, thiserror::Error)]
pub enum DescribeError {
    #[error("Description request rejected with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Description request was cancelled")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Description response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read description stream: {0}")]
    Stream(#[from] std::io::Error),
}
