//! End-to-end tests for the relay: a real TCP server with a scripted
//! completion backend, exercised through the relay client.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;

use codedraft::provider::{CompletionBackend, DeltaStream, Message, ProviderError};
use codedraft::relay;
use codedraft::ui::session::{self, Session};
use codedraft::ui::{Phase, RelayClient};
use codedraft::{Router, Server};

/// Backend that replays a fixed script instead of calling a provider.
struct ScriptedBackend {
    script: Vec<Result<String, String>>,
    open_error: Option<String>,
}

impl ScriptedBackend {
    fn deltas(deltas: &[&str]) -> Self {
        Self {
            script: deltas.iter().map(|d| Ok((*d).to_owned())).collect(),
            open_error: None,
        }
    }

    fn failing_mid_stream(deltas: &[&str], error: &str) -> Self {
        let mut script: Vec<Result<String, String>> =
            deltas.iter().map(|d| Ok((*d).to_owned())).collect();
        script.push(Err(error.to_owned()));
        Self {
            script,
            open_error: None,
        }
    }

    fn unavailable() -> Self {
        Self {
            script: Vec::new(),
            open_error: Some("connect refused".to_owned()),
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn open_stream(&self, _messages: Vec<Message>) -> Result<DeltaStream, ProviderError> {
        if let Some(message) = &self.open_error {
            return Err(ProviderError::Stream(message.clone()));
        }
        let items: Vec<Result<String, ProviderError>> = self
            .script
            .iter()
            .map(|item| match item {
                Ok(delta) => Ok(delta.clone()),
                Err(e) => Err(ProviderError::Stream(e.clone())),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

/// Starts a server on an ephemeral port and returns its base URL.
async fn spawn_server(backend: ScriptedBackend) -> String {
    let backend: Arc<dyn CompletionBackend> = Arc::new(backend);

    let mut router = Router::new();
    router.post("/api/generateCode", {
        let backend = Arc::clone(&backend);
        move |req| {
            let backend = Arc::clone(&backend);
            async move { relay::generate_code(backend.as_ref(), &req).await }
        }
    });
    let router = Arc::new(router);

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();

    tokio::spawn(async move {
        let _ = server
            .run(move |req| {
                let router = Arc::clone(&router);
                async move { router.route(req).await }
            })
            .await;
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn deltas_arrive_in_order_and_concatenate() {
    let base = spawn_server(ScriptedBackend::deltas(&[
        "import React from 'react';\n",
        "export default function App() {\n",
        "  return <button>Click</button>;\n",
        "}",
    ]))
    .await;

    let client = RelayClient::new(base);
    let mut session = Session::new();
    let token = session.begin("a button");

    let deltas = client.open_stream("a button").await.unwrap();
    let mut seen = Vec::new();
    session::drive(&mut session, deltas, token, |d| seen.push(d.to_owned())).await;

    assert_eq!(seen, vec![
        "import React from 'react';\n",
        "export default function App() {\n",
        "  return <button>Click</button>;\n",
        "}",
    ]);
    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(
        session.code(),
        "import React from 'react';\nexport default function App() {\n  return <button>Click</button>;\n}"
    );

    let preview = session.preview().unwrap();
    assert_eq!(
        preview.files.get("/App.tsx").map(String::as_str),
        Some(session.code())
    );
}

#[tokio::test]
async fn mid_stream_failure_reaches_client_as_error_event() {
    let base = spawn_server(ScriptedBackend::failing_mid_stream(
        &["const partial = 1;"],
        "upstream reset",
    ))
    .await;

    let client = RelayClient::new(base);
    let mut session = Session::new();
    let token = session.begin("anything");

    let deltas = client.open_stream("anything").await.unwrap();
    session::drive(&mut session, deltas, token, |_| {}).await;

    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.code(), "const partial = 1;");
    assert!(session.error().unwrap().contains("upstream reset"));
}

#[tokio::test]
async fn unavailable_backend_yields_bad_gateway() {
    let base = spawn_server(ScriptedBackend::unavailable()).await;

    let client = RelayClient::new(base);
    let err = client.open_stream("anything").await.unwrap_err();

    match err {
        codedraft::ui::client::ClientError::Status { status, body } => {
            assert_eq!(status, 502);
            assert!(body.contains("error"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_yields_bad_request() {
    let base = spawn_server(ScriptedBackend::deltas(&["unused"])).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/generateCode"))
        .header("Content-Type", "application/json")
        .body("{\"not_prompt\": 1}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn empty_generation_completes_with_no_preview() {
    let base = spawn_server(ScriptedBackend::deltas(&[])).await;

    let client = RelayClient::new(base);
    let mut session = Session::new();
    let token = session.begin("anything");

    let deltas = client.open_stream("anything").await.unwrap();
    session::drive(&mut session, deltas, token, |_| {}).await;

    assert_eq!(session.phase(), Phase::Complete);
    assert!(session.preview().is_none());
}
