use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use weft_core::config::AppConfig;
use weft_core::event::ChannelSink;
use weft_workflow::{FileDslLoader, Graph, WorkflowEngine, WorkflowService};

#[derive(Parser)]
#[command(name = "weft", version, about = "Streaming workflow runner for LLM and plugin pipelines")]
struct Cli {
    /// Path to config file (defaults to weft.toml, then ~/.weft/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow and stream its events to stdout
    Run {
        /// Workflow document (JSON)
        #[arg(required_unless_present = "flow", conflicts_with = "flow")]
        file: Option<PathBuf>,
        /// Workflow id, loaded from the configured workflows directory
        #[arg(long)]
        flow: Option<String>,
        /// Initial input as key=value (value parsed as JSON when possible)
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, Value)>,
    },
    /// Parse a workflow document and print its execution order
    Validate {
        file: PathBuf,
    },
    /// Print a signed connection URL for the model service
    Sign {
        /// Target URL (defaults to the configured api_url)
        #[arg(long)]
        url: Option<String>,
        /// RFC 1123 date to sign with (defaults to now)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info,warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { file, flow, inputs } => {
            let inputs: BTreeMap<String, Value> = inputs.into_iter().collect();
            run_workflow(&config, file, flow, inputs).await?;
        }
        Commands::Validate { file } => {
            let graph = read_graph(&file).await?;
            for (i, node) in graph.execution_order()?.iter().enumerate() {
                println!("{:>3}. {} ({})", i + 1, node.id(), node.type_label());
            }
        }
        Commands::Sign { url, date } => {
            if !config.spark.has_credentials() {
                warn!("spark.api_key / spark.api_secret not set; signing with empty key material");
            }
            let url = url.unwrap_or_else(|| config.spark.api_url.clone());
            let date = date.unwrap_or_else(weft_llm::rfc1123_now);
            let signed = weft_llm::sign_url(
                &url,
                &config.spark.api_key,
                &config.spark.api_secret,
                &date,
            )?;
            println!("{signed}");
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config.masked())?);
        }
    }

    Ok(())
}

/// Explicit path first; otherwise the first default location that exists.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }

    for path in AppConfig::default_paths() {
        if path.exists() {
            info!(path = %path.display(), "Loading config");
            return Ok(AppConfig::load(&path)?);
        }
    }

    warn!("No config file found, using defaults. See weft.toml.example for reference.");
    Ok(AppConfig::default())
}

async fn read_graph(path: &Path) -> anyhow::Result<Graph> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Graph::from_json(&text)?)
}

async fn run_workflow(
    config: &AppConfig,
    file: Option<PathBuf>,
    flow: Option<String>,
    inputs: BTreeMap<String, Value>,
) -> anyhow::Result<()> {
    if !config.spark.has_credentials() {
        warn!("Model service credentials are not configured; LLM nodes will fail");
    }

    let engine = Arc::new(WorkflowEngine::from_config(config)?);
    let loader = Arc::new(FileDslLoader::new(config.workflows_dir()));
    let service = WorkflowService::new(
        engine,
        loader,
        Duration::from_secs(config.workflows.run_timeout_secs),
    );

    let (sink, mut rx) = ChannelSink::new();
    let sink = Arc::new(sink);

    // Spawn event printer
    let print_handle = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(event) = rx.recv().await {
            write!(stdout, "{}", event.to_sse()).ok();
            stdout.flush().ok();
        }
    });

    let outcome = match (file, flow) {
        (Some(file), _) => {
            let graph = read_graph(&file).await?;
            service.run_graph(&graph, inputs, sink.clone()).await
        }
        (None, Some(flow)) => service.run(&flow, inputs, sink.clone()).await,
        (None, None) => anyhow::bail!("either a workflow file or --flow is required"),
    };

    // Last sender gone: the printer drains and exits.
    drop(sink);
    print_handle.await.ok();

    let report = outcome?;
    if let Some(output) = report.final_output {
        eprintln!("\n{output}");
    }
    Ok(())
}

fn parse_input(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err("input key must not be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
