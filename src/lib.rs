//! # codedraft
//!
//! A prompt-to-component playground: takes a natural-language prompt, streams
//! LLM-generated React source code back token-by-token, and feeds the growing
//! text into a sandboxed live preview widget in the browser.
//!
//! The HTTP surface is served by a small hand-rolled async HTTP/1.1 server
//! (tokio + httparse). The upstream completion provider is reached through the
//! narrow [`provider::CompletionBackend`] seam, which produces a lazy stream of
//! text deltas regardless of the provider's actual wire format.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codedraft::provider::{HttpBackend, ProviderConfig};
//! use codedraft::server::Server;
//! use codedraft::Router;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(HttpBackend::new(ProviderConfig::from_env()?));
//!     let mut router = Router::new();
//!     router.get("/", |_req| async { codedraft::ui::page::index() });
//!     router.post("/api/generateCode", move |req| {
//!         let backend = Arc::clone(&backend);
//!         async move { codedraft::relay::generate_code(backend.as_ref(), &req).await }
//!     });
//!
//!     let router = Arc::new(router);
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server
//!         .run(move |req| {
//!             let router = Arc::clone(&router);
//!             async move { router.route(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod provider;
pub mod relay;
pub mod router;
pub mod server;
pub mod ui;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
