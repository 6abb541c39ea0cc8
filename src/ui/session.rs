//! Generation session state.
//!
//! A [`Session`] tracks one prompt-to-preview cycle: the user submits a
//! prompt, deltas accumulate in arrival order into the generated code buffer,
//! and the session settles as complete or failed. Submitting a new prompt
//! cancels any stream still in flight, so at most one generation is ever
//! active per session.

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::preview::{self, PreviewDocument};
use crate::provider::DeltaStream;

/// Lifecycle phase of a generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No generation submitted yet, or the last one was fully reset.
    #[default]
    Idle,
    /// Deltas are being consumed.
    Streaming,
    /// The stream ended normally; the code buffer is final.
    Complete,
    /// The stream failed or was rejected; partial code may remain.
    Failed,
}

/// State for one prompt-to-preview cycle.
#[derive(Debug, Default)]
pub struct Session {
    prompt: String,
    code: String,
    error: Option<String>,
    phase: Phase,
    active: Option<CancellationToken>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation for `prompt`.
    ///
    /// Cancels any generation still in flight, clears the code buffer and any
    /// previous error, and returns the cancellation token guarding the new
    /// stream.
    pub fn begin(&mut self, prompt: impl Into<String>) -> CancellationToken {
        if let Some(previous) = self.active.take() {
            debug!("cancelling in-flight generation");
            previous.cancel();
        }
        self.prompt = prompt.into();
        self.code.clear();
        self.error = None;
        self.phase = Phase::Streaming;

        let token = CancellationToken::new();
        self.active = Some(token.clone());
        token
    }

    /// Appends one text fragment to the code buffer, in arrival order.
    pub fn push_delta(&mut self, delta: &str) {
        self.code.push_str(delta);
    }

    /// Marks the stream as ended normally.
    pub fn finish(&mut self) {
        self.phase = Phase::Complete;
        self.active = None;
    }

    /// Marks the stream as failed, keeping any deltas received so far.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.phase = Phase::Failed;
        self.active = None;
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The code accumulated so far.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The sandbox preview for the current code buffer, or `None` while the
    /// buffer is empty.
    pub fn preview(&self) -> Option<PreviewDocument> {
        preview::document(&self.code)
    }
}

/// Consumes `deltas` into `session` until the stream ends, fails, or `token`
/// is cancelled.
///
/// `on_delta` observes each fragment as it is applied, letting callers render
/// incrementally. Cancellation leaves the session untouched mid-flight; the
/// replacement generation has already reset it via [`Session::begin`].
pub async fn drive<F>(
    session: &mut Session,
    mut deltas: DeltaStream,
    token: CancellationToken,
    mut on_delta: F,
) where
    F: FnMut(&str),
{
    use futures::StreamExt;

    loop {
        select! {
            _ = token.cancelled() => {
                debug!("generation cancelled");
                return;
            }
            item = deltas.next() => match item {
                Some(Ok(delta)) => {
                    session.push_delta(&delta);
                    on_delta(&delta);
                }
                Some(Err(e)) => {
                    session.fail(e.to_string());
                    return;
                }
                None => {
                    session.finish();
                    return;
                }
            },
        }
    }
}
