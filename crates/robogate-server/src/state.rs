// crates/robogate-server/src/state.rs
// ============================================================================
// Module: Application State
// Description: The shared collaborators every handler in this crate needs.
// Purpose: One `Clone`-cheap bundle of `Arc`s, wired once at startup and
//          handed to `axum::Router::with_state`.
// Dependencies: robogate-runtime, robogate-core, robogate-config
// ============================================================================

use std::sync::Arc;

use robogate_config::RuntimeConfig;
use robogate_core::MissionId;
use robogate_core::Point2;
use robogate_core::RunId;
use robogate_core::interfaces::EventLogStore;
use robogate_core::interfaces::Hub;
use robogate_core::interfaces::SimulatorClient;
use robogate_runtime::RunServiceError;
use robogate_runtime::control_loop::run_control_loop;
use robogate_runtime::facade::DecisionFacade;
use robogate_runtime::registry::RunHandle;
use robogate_runtime::registry::RunRegistry;

use crate::missions::MissionStore;

/// The collaborators every handler needs, cloned cheaply per request.
#[derive(Clone)]
pub struct AppState {
    /// Run-lifecycle task table (C7).
    pub registry: Arc<RunRegistry>,
    /// Synchronous Decision API facade (C8).
    pub facade: Arc<DecisionFacade>,
    /// Simulator adapter (C5).
    pub sim: Arc<dyn SimulatorClient>,
    /// Hash-chained event log (C2).
    pub store: Arc<dyn EventLogStore>,
    /// Broadcast hub (C6).
    pub hub: Arc<dyn Hub>,
    /// Validated runtime configuration.
    pub config: Arc<RuntimeConfig>,
    /// In-memory mission CRUD store.
    pub missions: Arc<MissionStore>,
}

impl AppState {
    /// Wires a fresh `AppState` over the given collaborators.
    #[must_use]
    pub fn new(
        sim: Arc<dyn SimulatorClient>,
        store: Arc<dyn EventLogStore>,
        hub: Arc<dyn Hub>,
        config: Arc<RuntimeConfig>,
    ) -> Self {
        let facade = Arc::new(DecisionFacade::new(Arc::clone(&sim), Arc::clone(&store), Arc::clone(&config)));
        Self {
            registry: Arc::new(RunRegistry::new()),
            facade,
            sim,
            store,
            hub,
            config,
            missions: Arc::new(MissionStore::new()),
        }
    }

    /// Spawns a new run's control loop toward `goal` under the given
    /// mission and run identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`RunServiceError::AlreadyRunning`] if `run_id` already has
    /// an active task.
    pub fn spawn_run(&self, mission_id: MissionId, run_id: RunId, goal: Point2) -> Result<RunHandle, RunServiceError> {
        let sim = Arc::clone(&self.sim);
        let store = Arc::clone(&self.store);
        let hub = Arc::clone(&self.hub);
        let config = Arc::clone(&self.config);
        self.registry.start_run(mission_id, run_id, move |run_id, stop_flag| {
            run_control_loop(run_id, goal, sim, store, hub, config, stop_flag)
        })
    }
}
