//! HTTP client for the relay's SSE endpoint.
//!
//! Used by the `generate` CLI subcommand and the integration tests; the
//! browser page talks to the same endpoint with `fetch`.

use futures::TryStreamExt;
use thiserror::Error;

use crate::provider::sse::{Parsed, decode_stream};
use crate::provider::{DeltaStream, ProviderError};
use crate::relay::{DONE_EVENT, StreamEvent};

/// Errors opening a relay stream.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("relay returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for `POST /api/generateCode`.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Submits `prompt` and returns the stream of decoded deltas.
    pub async fn open_stream(&self, prompt: &str) -> Result<DeltaStream, ClientError> {
        let url = format!("{}/api/generateCode", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_stream(
            response.bytes_stream().map_err(|e| e.to_string()),
            parse_relay_event,
        ))
    }
}

// Decode one relay SSE payload.
fn parse_relay_event(payload: &str) -> Parsed {
    if payload == DONE_EVENT {
        return Parsed::Done;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(StreamEvent::Delta { delta }) => Parsed::Delta(delta),
        Ok(StreamEvent::Error { error }) => Parsed::Fail(ProviderError::Stream(error)),
        Err(e) => Parsed::Fail(ProviderError::Stream(format!(
            "malformed relay event: {e}"
        ))),
    }
}
