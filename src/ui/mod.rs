//! Browser-facing UI: the served page, the relay client, and the session
//! state machine that accumulates streamed deltas into a sandbox preview.

pub mod client;
pub mod page;
pub mod preview;
pub mod session;

pub use client::RelayClient;
pub use preview::PreviewDocument;
pub use session::{Phase, Session};
