//! Streaming chat-completion client for OpenAI-compatible APIs.

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sse::{Parsed, decode_stream};
use super::{CompletionBackend, DeltaStream, Message, ProviderConfig, ProviderError};

/// End-of-stream sentinel used by OpenAI-compatible streaming APIs.
const DONE_SENTINEL: &str = "[DONE]";

/// Wire request for a streaming chat completion.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

// Streaming response chunk. Only the delta content is of interest; every other
// field the provider sends is ignored.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

// Parse one SSE payload from the provider into a delta.
fn parse_chunk(payload: &str) -> Parsed {
    if payload == DONE_SENTINEL {
        return Parsed::Done;
    }
    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content);
            match content {
                Some(text) if !text.is_empty() => Parsed::Delta(text),
                _ => Parsed::Skip,
            }
        }
        Err(e) => Parsed::Fail(ProviderError::Stream(format!(
            "malformed provider chunk: {e}"
        ))),
    }
}

/// [`CompletionBackend`] backed by an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpBackend {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Uses a caller-supplied client, e.g. one with custom timeouts.
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for HttpBackend {
    async fn open_stream(&self, messages: Vec<Message>) -> Result<DeltaStream, ProviderError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            stream: true,
        };

        debug!(model = %self.config.model, turns = messages.len(), "opening completion stream");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_stream(
            response.bytes_stream().map_err(|e| e.to_string()),
            parse_chunk,
        ))
    }
}
