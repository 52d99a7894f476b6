//! `nebula` — a small binary that exercises the execution engine end to end
//! against an in-memory stub `AgentInvoker`, for local smoke-testing. Not
//! part of the library surface; production embedders link the `nebula-*`
//! crates directly and supply their own collaborators.

mod stub;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use nebula_engine::{Engine, EngineConfig, Submission};
use nebula_eventbus::ProgressMessage;
use nebula_webhook::WebhookRegistry;
use nebula_workflow::GraphWire;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "nebula", version, about = "Nebula workflow execution engine — local smoke-test CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and run a graph from a JSON file, streaming progress to stderr.
    Run {
        /// Path to a JSON file shaped like `{"nodes": [...], "edges": [...]}`.
        graph: PathBuf,
        /// JSON value (or bare string) passed as the execution's input.
        #[arg(long, default_value = "null")]
        input: String,
        #[arg(long, default_value = "anonymous")]
        user: String,
        #[arg(long, default_value = "default")]
        framework: String,
    },
    /// Register a graph as a webhook, then synchronously trigger it once
    /// with the given body — exercises C10 without an HTTP server.
    Webhook {
        graph: PathBuf,
        #[arg(long, default_value = "null")]
        body: String,
        #[arg(long, default_value = "anonymous")]
        user: String,
        #[arg(long, default_value = "default")]
        framework: String,
    },
}

fn main() -> anyhow::Result<()> {
    let _guard = nebula_log::init().map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async move {
        match cli.command {
            Command::Run { graph, input, user, framework } => run(graph, input, user, framework).await,
            Command::Webhook { graph, body, user, framework } => webhook(graph, body, user, framework).await,
        }
    })
}

fn load_graph(path: PathBuf) -> anyhow::Result<GraphWire> {
    let text = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    let graph: GraphWire = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("parsing {} as a graph: {e}", path.display()))?;
    Ok(graph)
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn new_engine() -> Arc<Engine> {
    Engine::new(
        EngineConfig::default(),
        Arc::new(stub::EchoAgentInvoker),
        Arc::new(stub::NoCredentialBroker),
        Arc::new(stub::UnreachableToolTransport),
        Arc::new(stub::DiscardGraphStore),
        stub::noop_pricing(),
    )
}

async fn run(graph_path: PathBuf, input: String, user: String, framework: String) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    let engine = new_engine();

    let submission = Submission { graph, input: parse_value(&input), framework, user_id: Some(user), identity: None };

    let execution_id = Arc::clone(&engine).submit(submission);
    let mut subscription = engine.subscribe(&execution_id);

    eprintln!("submitted {execution_id}");
    loop {
        let message = subscription.receiver.recv().await?;
        match message {
            ProgressMessage::ExecutionUpdate { status, progress, result, error, .. } => {
                let percent = progress.get("percent").and_then(Value::as_u64).unwrap_or(0);
                eprintln!("[{status}] {percent}%");
                if status == "completed" || status == "failed" {
                    if let Some(result) = result {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    }
                    if let Some(error) = error {
                        eprintln!("error: {}", serde_json::to_string_pretty(&error)?);
                        std::process::exit(1);
                    }
                    break;
                }
            }
            ProgressMessage::InputRequest { question, .. } => {
                eprintln!("waiting for input: {question}");
                eprintln!("(the CLI smoke-test harness has no interactive reply path — cancelling)");
                engine.cancel(&execution_id);
            }
            ProgressMessage::InputReceived { input } => {
                eprintln!("input received: {input}");
            }
        }
    }

    Ok(())
}

async fn webhook(graph_path: PathBuf, body: String, user: String, framework: String) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    let engine = new_engine();
    let registry = WebhookRegistry::new();

    let (webhook_id, url) = registry.register(graph, user, framework);
    eprintln!("registered {webhook_id} at {url}");

    let outcome = tokio::time::timeout(
        Duration::from_secs(60),
        nebula_webhook::trigger(Arc::clone(&engine), &registry, &webhook_id, parse_value(&body)),
    )
    .await??;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
