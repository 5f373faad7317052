// system-tests/src/harness.rs
// ============================================================================
// Module: Server Harness
// Description: Spins up a real robogate-server instance over a loopback
//              TCP listener, backed by a file-backed SQLite event log and a
//              scriptable mock simulator.
// Purpose: Let system-tests drive the actual HTTP surface with `reqwest`
//          instead of calling handlers in-process, the way an operator or
//          the CLI would.
// Dependencies: robogate-server, robogate-sim, robogate-eventlog-sqlite,
//               robogate-hub, robogate-config, tokio
// ============================================================================

//! ## Overview
//! Grounded on the bind-a-listener-then-spawn-the-server-task shape used for
//! harness setup across the pack's own system-test suites: the harness binds
//! port `0` so concurrent test binaries never collide, learns the resolved
//! port from the listener before handing the router to `axum::serve`, and
//! keeps every collaborator (`TempDir`, join handle) alive for the scope of
//! the returned value.

use std::sync::Arc;

use robogate_config::RuntimeConfig;
use robogate_core::interfaces::EventLogStore;
use robogate_core::interfaces::Hub;
use robogate_core::interfaces::SimulatorClient;
use robogate_core::telemetry::Telemetry;
use robogate_core::world::World;
use robogate_eventlog_sqlite::SqliteEventLogConfig;
use robogate_eventlog_sqlite::SqliteEventLogStore;
use robogate_hub::BroadcastHub;
use robogate_server::AppState;
use robogate_sim::MockSimulatorClient;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// A running `robogate-server` instance plus the collaborators a test needs
/// direct access to (the mock simulator, for scripting scenarios; the
/// SQLite path, for chain-tamper and CLI tests).
pub struct Harness {
    /// `http://127.0.0.1:<port>` for the running server.
    pub base_url: String,
    /// The mock simulator backing this server, for `register_scenario`/
    /// `fail_next_telemetry_call` from the test.
    pub sim: Arc<MockSimulatorClient>,
    /// Path to the SQLite event log file backing this server.
    pub store_path: std::path::PathBuf,
    /// The runtime configuration the server was built with.
    pub config: Arc<RuntimeConfig>,
    _temp_dir: TempDir,
    _server_task: JoinHandle<()>,
}

impl Harness {
    /// Starts a server seeded with `telemetry_script` and `world`, using the
    /// default [`RuntimeConfig`].
    pub async fn start(telemetry_script: Vec<Telemetry>, world: World) -> Self {
        Self::start_with_config(telemetry_script, world, RuntimeConfig::default()).await
    }

    /// Starts a server with an overridden [`RuntimeConfig`] (e.g. a faster
    /// tick period, or tighter hub limits).
    pub async fn start_with_config(telemetry_script: Vec<Telemetry>, world: World, config: RuntimeConfig) -> Self {
        let temp_dir = tempfile::tempdir().expect("tempdir for event log");
        let store_path = temp_dir.path().join("events.sqlite3");

        let sim = Arc::new(MockSimulatorClient::new(telemetry_script, world));
        let sim_trait: Arc<dyn SimulatorClient> = Arc::clone(&sim);
        let store: Arc<dyn EventLogStore> = Arc::new(
            SqliteEventLogStore::open(SqliteEventLogConfig { path: store_path.clone(), ..SqliteEventLogConfig::default() })
                .expect("open event log"),
        );
        let hub: Arc<dyn Hub> = Arc::new(BroadcastHub::with_limits(config.hub.subscriber_buffer, config.hub.slow_sub_evict));
        let config = Arc::new(config);

        let state = AppState::new(sim_trait, store, hub, Arc::clone(&config));
        let router = robogate_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let server_task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { base_url: format!("http://{addr}"), sim, store_path, config, _temp_dir: temp_dir, _server_task: server_task }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self._server_task.abort();
    }
}
