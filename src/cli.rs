// cli.rs — Command-line front end for the transformation engine

use crate::backend::BackendAvailability;
use crate::config::{self, BackendConfig, BackendConfigOverride, ConfigError};
use crate::orchestrator::custom::CustomError;
use crate::orchestrator::{BatchError, OrchestrationEngine};
use crate::prompt_engine::{ContentCategory, HeuristicClassifier, PromptPlanner, TransformationKind};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "clipboard-ai", version, about = "AI rewrites for clipboard content via a local model server")]
struct Cli {
    /// JSON settings file (created with defaults when missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the backend base URL (OpenAI-compatible, e.g. http://localhost:11434/v1)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the model name
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the backend and print its status
    Status,
    /// Generate ranked suggestions for content read from a file or stdin
    Suggest {
        /// Content category; detected from the content when omitted
        #[arg(long, conflicts_with = "kind")]
        category: Option<ContentCategory>,
        /// Request only this transformation (e.g. translation, validation)
        #[arg(long)]
        kind: Option<TransformationKind>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Apply a free-text instruction to content read from a file or stdin
    Custom {
        /// What to do with the content; a general rewrite when omitted
        #[arg(long, short)]
        instruction: Option<String>,
        /// Extra context passed to the model, in order (repeatable)
        #[arg(long = "context")]
        context: Vec<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Report backend availability changes until interrupted
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read content: {0}")]
    Input(#[from] std::io::Error),

    #[error("Content is empty")]
    EmptyContent,

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("AI request failed: {0}")]
    Custom(#[from] CustomError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    let engine = OrchestrationEngine::ollama()
        .with_planner(PromptPlanner::with_classifier(Box::new(HeuristicClassifier)));

    match cli.command {
        Command::Status => {
            let status = engine.health().refresh(&config).await;
            print_json(&status)
        }
        Command::Suggest {
            category,
            kind,
            file,
        } => {
            let content = read_content(file.as_ref())?;
            let cancel = cancel_on_ctrl_c();

            let results = match kind {
                Some(kind) => engine.run_transformation(&content, kind, &config, &cancel).await?,
                None => engine.run_batch(&content, category, &config, &cancel).await?,
            };
            if results.is_empty() {
                eprintln!("No suggestions available.");
            }
            print_json(&results)
        }
        Command::Custom {
            instruction,
            context,
            file,
        } => {
            let content = read_content(file.as_ref())?;
            let cancel = cancel_on_ctrl_c();

            match engine
                .process_custom(&content, instruction.as_deref(), &context, &config, &cancel)
                .await?
            {
                Some(result) => print_json(&result),
                None => {
                    eprintln!("Cancelled.");
                    Ok(())
                }
            }
        }
        Command::Watch { interval_secs } => {
            let shutdown = cancel_on_ctrl_c();
            let health = Arc::clone(engine.health());
            let mut availability = health.subscribe();
            let mut last_reported = None;
            let handle = health.spawn_watch(
                config,
                Duration::from_secs(interval_secs.max(1)),
                shutdown.clone(),
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = availability.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = *availability.borrow_and_update();
                        if let Some(state) = availability_change(&mut last_reported, state) {
                            println!("{:?}", state);
                        }
                    }
                }
            }

            let _ = handle.await;
            Ok(())
        }
    }
}

/// Settled states that differ from the last one reported.
fn availability_change(
    last: &mut Option<BackendAvailability>,
    state: BackendAvailability,
) -> Option<BackendAvailability> {
    if state == BackendAvailability::Probing || *last == Some(state) {
        return None;
    }
    *last = Some(state);
    Some(state)
}

fn resolve_config(cli: &Cli) -> Result<BackendConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_or_create(path)?,
        None => BackendConfig::from_env()?,
    };

    config.apply_override(BackendConfigOverride {
        base_url: cli.base_url.clone(),
        model_name: cli.model.clone(),
        ..Default::default()
    });

    Ok(config)
}

fn read_content(file: Option<&PathBuf>) -> Result<String, CliError> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if content.trim().is_empty() {
        return Err(CliError::EmptyContent);
    }
    Ok(content)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
