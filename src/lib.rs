mod cli;
pub mod backend;
pub mod config;
pub mod orchestrator;
pub mod prompt_engine;

pub use backend::{BackendAvailability, BackendError, BackendGateway, BackendStatus, HealthMonitor, OllamaGateway};
pub use config::{BackendConfig, BackendConfigOverride, ConfigError};
pub use orchestrator::custom::{CustomError, CustomInstructionProcessor, CUSTOM_CONFIDENCE};
pub use orchestrator::diagnostics::{DiagnosticEvent, DiagnosticSink, TracingSink};
pub use orchestrator::scoring::ScoringPolicy;
pub use orchestrator::{BatchError, OrchestrationEngine, TransformationResult};
pub use prompt_engine::{
    ContentCategory, ContentClassifier, HeuristicClassifier, PromptPlanner, PromptSpec,
    TransformationKind,
};

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global `tracing` subscriber (`RUST_LOG` overrides the default filter).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(cli::run())
}
