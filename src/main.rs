//! CLI for toolcall-agent: list tools, run one tool, or chat with tools.
//!
//! Provider settings come from the environment, see [`ProviderConfig`].

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolcall_agent::store::InMemoryToolStore;
use toolcall_agent::tool::{to_wire_format, ReqwestTransport, ToolKind};
use toolcall_agent::{
    BuiltinSynchronizer, ChatOrchestrator, ChatRequest, ProviderConfig, ToolExecutor, ToolLoader,
    ToolRegistry,
};

/// Agent that the CLI binds every synchronized builtin to.
const DEFAULT_AGENT_ID: i64 = 1;

#[derive(Parser)]
#[command(name = "toolcall-agent")]
#[command(about = "Chat with an OpenAI-compatible model that can call tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered tools and their provider-facing definitions
    Tools,
    /// Run a single tool with JSON arguments
    Call {
        /// Tool name, e.g. calculator
        tool: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,
    },
    /// Send one message and let the model call tools
    Chat {
        message: String,
        /// Only offer the tools bound to this agent (agent 1 has every builtin)
        #[arg(long)]
        agent_id: Option<i64>,
        /// Model name (defaults to TOOLCALL_MODEL)
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let registry = Arc::new(ToolRegistry::with_builtins());
    let store = Arc::new(InMemoryToolStore::new());
    BuiltinSynchronizer::new(registry.clone(), store.clone())
        .synchronize()
        .await;
    let bound = store.bind_kind(DEFAULT_AGENT_ID, ToolKind::Builtin).await;
    tracing::debug!(agent_id = DEFAULT_AGENT_ID, bound, "Bound builtin tools to default agent");

    let executor = ToolExecutor::new(registry.clone(), Arc::new(ReqwestTransport::new()));

    match args.command {
        Command::Tools => {
            for name in registry.names() {
                if let Some(tool) = registry.get(name) {
                    println!("{}", serde_json::to_string_pretty(&to_wire_format(tool))?);
                }
            }
        }
        Command::Call { tool, arguments } => {
            let output = executor.execute(&tool, &arguments).await?;
            println!("{}", output);
        }
        Command::Chat {
            message,
            agent_id,
            model,
            temperature,
            max_tokens,
        } => {
            let config = ProviderConfig::from_env()?;
            tracing::info!(config = ?config, "Loaded provider configuration");

            let provider = config
                .build_client()
                .context("failed to create provider client")?;
            let loader = ToolLoader::new(registry.clone(), store);
            let orchestrator =
                ChatOrchestrator::new(provider, executor, loader, config.chat_defaults());

            let mut request = ChatRequest::user(message);
            request.agent_id = agent_id;
            request.model = model;
            request.temperature = temperature;
            request.max_tokens = max_tokens;

            let token = CancellationToken::new();
            let on_interrupt = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let response = orchestrator
                .chat_with_tools_cancellable(request, &token)
                .await?;

            println!("{}", response.content);
            if !response.tool_calls.is_empty() {
                println!();
                println!("Tool calls:");
                for call in &response.tool_calls {
                    let status = if call.success { "ok" } else { "failed" };
                    println!("  [{}] {}({}) -> {}", status, call.name, call.arguments, call.result);
                }
            }
            println!(
                "\nTokens: {} prompt, {} completion, {} total",
                response.usage.prompt_tokens,
                response.usage.completion_tokens,
                response.usage.total_tokens
            );
        }
    }

    Ok(())
}
