//! Inference provider integration.
//!
//! The rest of the application never sees the provider's wire format. It talks
//! to [`CompletionBackend`], a narrow seam that opens a lazy, forward-only,
//! finite stream of text deltas for a given message list. Dropping the stream
//! stops upstream consumption (best effort). The production implementation is
//! [`HttpBackend`], an OpenAI-compatible streaming chat-completion client.

use std::env;
use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;
pub mod sse;

pub use http::HttpBackend;

/// A lazy, forward-only stream of generated text fragments.
///
/// Finite and not restartable; the consumer may stop polling (and drop the
/// stream) at any point to cancel upstream consumption.
pub type DeltaStream = Pin<Box<dyn DeltaItems + Send>>;

/// Object-safe supertrait behind [`DeltaStream`].
///
/// Exists so the boxed trait object can carry a `Debug` impl (the orphan rule
/// forbids one on `dyn Stream<..>` directly); blanket-implemented for every
/// stream with the right item type.
pub trait DeltaItems: Stream<Item = Result<String, ProviderError>> {}

impl<S: ?Sized + Stream<Item = Result<String, ProviderError>>> DeltaItems for S {}

impl fmt::Debug for dyn DeltaItems + Send {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeltaStream")
    }
}

/// A conversation role in a chat-completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// A `system` turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A `user` turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Errors produced while opening or consuming a completion stream.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing environment variable {var}")]
    MissingEnv { var: &'static str },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("stream error: {0}")]
    Stream(String),
}

/// Opens streaming completions for a message list.
///
/// The single seam between the application and the inference provider;
/// substitutable in tests with a scripted implementation.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issues exactly one streaming completion request for `messages` and
    /// returns the resulting delta stream.
    async fn open_stream(&self, messages: Vec<Message>) -> Result<DeltaStream, ProviderError>;
}

/// Connection settings for the completion provider.
///
/// Credentials come from the process environment but are injected explicitly
/// into [`HttpBackend`] so the dependency stays substitutable.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Full URL of the chat-completions endpoint.
    pub api_url: String,
    /// Bearer token for the provider.
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
}

/// Default chat-completions endpoint (Together AI).
pub const DEFAULT_API_URL: &str = "https://api.together.xyz/v1/chat/completions";

/// Default code-generation model.
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo";

impl ProviderConfig {
    /// Builds a config from the process environment.
    ///
    /// `TOGETHER_API_KEY` is required; `TOGETHER_API_URL` and `CODEDRAFT_MODEL`
    /// override the defaults.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("TOGETHER_API_KEY")
            .map_err(|_| ProviderError::MissingEnv {
                var: "TOGETHER_API_KEY",
            })?;
        let api_url = env::var("TOGETHER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let model = env::var("CODEDRAFT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        Ok(Self {
            api_url,
            api_key,
            model,
        })
    }
}

impl fmt::Debug for ProviderConfig {
    // The API key never reaches logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(Message::system("a").role, Role::System);
        assert_eq!(Message::user("b").role, Role::User);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ProviderConfig {
            api_url: DEFAULT_API_URL.to_owned(),
            api_key: "secret".to_owned(),
            model: DEFAULT_MODEL.to_owned(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
