use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use codedraft::provider::{HttpBackend, ProviderConfig};
use codedraft::ui::session::{self, Session};
use codedraft::ui::{Phase, RelayClient, page};
use codedraft::{Router, Server, relay};

#[derive(Parser)]
#[command(name = "codedraft", about = "Prompt-to-component code generation over SSE")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default).
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
    /// Generate code for a prompt from the terminal via a running server.
    Generate {
        /// What to build.
        prompt: String,
        /// Origin of the codedraft server.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve {
        addr: "127.0.0.1:8080".to_owned(),
    }) {
        Command::Serve { addr } => serve(&addr).await,
        Command::Generate { prompt, server } => generate(&prompt, &server).await,
    }
}

async fn serve(addr: &str) -> anyhow::Result<()> {
    let config = ProviderConfig::from_env().context("provider configuration")?;
    let backend = Arc::new(HttpBackend::new(config));

    let mut router = Router::new();
    router.get("/", |_req| async { page::index() });
    router.post("/api/generateCode", {
        let backend = Arc::clone(&backend);
        move |req| {
            let backend = Arc::clone(&backend);
            async move { relay::generate_code(backend.as_ref(), &req).await }
        }
    });

    let router = Arc::new(router);
    let server = Server::bind(addr).await?;
    server
        .run(move |req| {
            let router = Arc::clone(&router);
            async move { router.route(req).await }
        })
        .await?;
    Ok(())
}

async fn generate(prompt: &str, server: &str) -> anyhow::Result<()> {
    let client = RelayClient::new(server);
    let mut session = Session::new();
    let token = session.begin(prompt);

    let deltas = client
        .open_stream(prompt)
        .await
        .context("opening generation stream")?;

    let mut stdout = std::io::stdout();
    session::drive(&mut session, deltas, token, |delta| {
        let _ = stdout.write_all(delta.as_bytes());
        let _ = stdout.flush();
    })
    .await;
    println!();

    match session.phase() {
        Phase::Failed => anyhow::bail!(
            "generation failed: {}",
            session.error().unwrap_or("unknown error")
        ),
        _ if session.preview().is_none() => {
            eprintln!("(the model produced no code)");
            Ok(())
        }
        _ => Ok(()),
    }
}
