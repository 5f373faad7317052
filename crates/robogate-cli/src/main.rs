// crates/robogate-cli/src/main.rs
// ============================================================================
// Module: Robogate CLI Entry Point
// Description: Command dispatcher wiring the concrete simulator/event-log/
//              hub collaborators and starting the HTTP server.
// Purpose: Give the runtime governance layer a process to run as (§6).
// Dependencies: clap, robogate-config, robogate-core, robogate-eventlog-sqlite,
//               robogate-hub, robogate-server, robogate-sim, tokio, tracing
// ============================================================================

//! ## Overview
//! `serve` is the only long-running command: it loads [`RuntimeConfig`],
//! builds the production [`HttpSimulatorClient`]/[`SqliteEventLogStore`]/
//! [`BroadcastHub`] collaborators, and hands them to `robogate-server`'s
//! router. `verify-chain` is an offline utility over the same event log,
//! useful after a crash or for an operator auditing a run's history.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use robogate_config::RuntimeConfig;
use robogate_core::RunId;
use robogate_core::interfaces::EventLogStore;
use robogate_core::interfaces::Hub;
use robogate_core::interfaces::SimulatorClient;
use robogate_eventlog_sqlite::SqliteEventLogConfig;
use robogate_eventlog_sqlite::SqliteEventLogStore;
use robogate_hub::BroadcastHub;
use robogate_server::AppState;
use robogate_sim::HttpSimulatorClient;
use robogate_sim::HttpSimulatorConfig;
use thiserror::Error;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "robogate", about = "Runtime governance layer between a planner and its actuators")]
struct Cli {
    /// Optional TOML file overriding environment-derived configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Starts the HTTP/WebSocket server.
    Serve {
        /// Address to bind the HTTP listener to.
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
        /// Path to the `SQLite` event log database file.
        #[arg(long, default_value = "robogate-events.sqlite3")]
        event_log_path: PathBuf,
    },
    /// Verifies a run's hash chain against the event log on disk.
    VerifyChain {
        /// Run identifier to verify.
        #[arg(long)]
        run_id: String,
        /// Path to the `SQLite` event log database file.
        #[arg(long, default_value = "robogate-events.sqlite3")]
        event_log_path: PathBuf,
    },
}

/// Errors surfaced at the CLI boundary, each mapped to an exit code by [`main`].
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] robogate_config::ConfigError),
    /// A collaborator failed to initialize or the server failed to start.
    #[error("startup failure: {0}")]
    Startup(String),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Config(err)) => {
            tracing::error!(error = %err, "configuration error");
            ExitCode::from(1)
        }
        Err(CliError::Startup(detail)) => {
            tracing::error!(error = %detail, "startup failure");
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = Arc::new(RuntimeConfig::load(cli.config.as_deref())?);

    match cli.command {
        Commands::Serve { bind, event_log_path } => command_serve(config, bind, event_log_path).await,
        Commands::VerifyChain { run_id, event_log_path } => command_verify_chain(event_log_path, run_id).await,
    }
}

async fn command_serve(config: Arc<RuntimeConfig>, bind: SocketAddr, event_log_path: PathBuf) -> Result<(), CliError> {
    let sim_config = HttpSimulatorConfig {
        base_url: config.sim.base_url.clone(),
        token: config.sim.token.clone(),
        telemetry_timeout_ms: config.sim.telemetry_timeout_ms,
        command_timeout_ms: config.sim.command_timeout_ms,
    };
    let sim: Arc<dyn SimulatorClient> =
        Arc::new(HttpSimulatorClient::new(sim_config).map_err(|err| CliError::Startup(err.to_string()))?);

    let store_config = SqliteEventLogConfig { path: event_log_path, ..SqliteEventLogConfig::default() };
    let store: Arc<dyn EventLogStore> =
        Arc::new(SqliteEventLogStore::open(store_config).map_err(|err| CliError::Startup(err.to_string()))?);

    let hub: Arc<dyn Hub> = Arc::new(BroadcastHub::with_limits(config.hub.subscriber_buffer, config.hub.slow_sub_evict));

    let state = AppState::new(sim, store, hub, config);
    let router = robogate_server::build_router(state);
    robogate_server::serve(router, bind).await.map_err(|err| CliError::Startup(err.to_string()))
}

async fn command_verify_chain(event_log_path: PathBuf, run_id: String) -> Result<(), CliError> {
    let store_config = SqliteEventLogConfig { path: event_log_path, ..SqliteEventLogConfig::default() };
    let store = SqliteEventLogStore::open(store_config).map_err(|err| CliError::Startup(err.to_string()))?;
    let verification =
        store.verify(&RunId::new(run_id.clone())).await.map_err(|err| CliError::Startup(err.to_string()))?;
    if verification.ok {
        tracing::info!(run_id = %run_id, "chain verified clean");
        Ok(())
    } else {
        Err(CliError::Startup(format!("chain broken at seq {:?}", verification.break_at)))
    }
}
