//! The code-generation relay endpoint.
//!
//! `POST /api/generateCode` accepts `{"prompt": "..."}`, builds a fixed
//! two-turn conversation around the prompt, opens a completion stream on the
//! injected [`CompletionBackend`], and relays the resulting text deltas to the
//! client as server-sent events. The provider's wire format never reaches the
//! client: every delta is re-encoded as a `{"delta": ...}` event, mid-stream
//! failures as a `{"error": ...}` event, and the stream always ends with a
//! `[DONE]` sentinel frame.

use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::http::{Request, Response, StatusCode};
use crate::provider::{CompletionBackend, Message};

/// Instructions sent as the system turn of every generation request.
pub const SYSTEM_PROMPT: &str = "You are an expert frontend React engineer who is also a great UI/UX designer. \
     Create a React component for whatever the user asks you to make. \
     Make sure the React app is interactive and functional by creating state when needed and having no required props. \
     Use TypeScript as the language for the React component. \
     Style the component with Tailwind CSS classes, avoiding arbitrary values. \
     ONLY return the full React code starting with the imports, nothing else. \
     DO NOT include backticks or a markdown code fence in your response.";

/// End-of-stream sentinel payload sent as the final SSE frame.
pub const DONE_EVENT: &str = "[DONE]";

/// Request body for `POST /api/generateCode`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// One event on the relay's outgoing SSE stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// A fragment of generated code.
    Delta { delta: String },
    /// A mid-stream failure; the stream ends after this event.
    Error { error: String },
}

/// Builds the fixed two-turn conversation for a prompt.
pub fn build_messages(prompt: &str) -> Vec<Message> {
    vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)]
}

/// Frames a raw payload as a single SSE `data:` frame.
pub fn sse_frame(payload: &str) -> Bytes {
    Bytes::from(format!("data: {payload}\n\n"))
}

// Frame a stream event as SSE. Event serialization cannot fail (string fields
// only), so a failure here is a programming error surfaced as an error frame.
fn encode_event(event: &StreamEvent) -> Bytes {
    match serde_json::to_string(event) {
        Ok(json) => sse_frame(&json),
        Err(e) => sse_frame(&format!(r#"{{"error":"encoding failure: {e}"}}"#)),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::new(status)
        .header("Content-Type", "application/json")
        .body(body)
        .keep_alive(false)
}

/// Handles `POST /api/generateCode`.
///
/// Returns `400` for a missing or malformed body, `502` when the completion
/// stream cannot be opened, and otherwise a `200 text/event-stream` response
/// whose body relays deltas as they arrive.
pub async fn generate_code(backend: &dyn CompletionBackend, request: &Request) -> Response {
    let generate: GenerateRequest = match request.json() {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "rejecting malformed generate request");
            return error_response(StatusCode::BadRequest, "expected JSON body with a \"prompt\" field");
        }
    };

    info!(prompt = %generate.prompt, "generating code");

    let deltas = match backend.open_stream(build_messages(&generate.prompt)).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "failed to open completion stream");
            return error_response(StatusCode::BadGateway, "completion provider unavailable");
        }
    };

    let events = deltas
        .map(|item| -> std::io::Result<Bytes> {
            let event = match item {
                Ok(delta) => StreamEvent::Delta { delta },
                Err(e) => {
                    warn!(error = %e, "completion stream failed mid-generation");
                    StreamEvent::Error {
                        error: e.to_string(),
                    }
                }
            };
            Ok(encode_event(&event))
        })
        .chain(futures::stream::once(async {
            Ok(sse_frame(DONE_EVENT))
        }));

    Response::new(StatusCode::Ok)
        .header("Content-Type", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .keep_alive(false)
        .stream(Box::pin(events))
}
