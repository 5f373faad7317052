// crates/robogate-sim/src/mock.rs
// ============================================================================
// Module: Mock Simulator Client
// Description: An in-memory, deterministic SimulatorClient used by
//              system-tests and unit tests; no network, no real clock.
// Purpose: Give §8's literal end-to-end scenarios a harness to run against,
//          since this repo owns no real simulator process.
// Dependencies: robogate-core, tokio (sync primitives only)
// ============================================================================

//! ## Overview
//! [`MockSimulatorClient`] replays a pre-scripted sequence of [`Telemetry`]
//! snapshots, one per call to `get_telemetry`, holding the last snapshot
//! once the script is exhausted. `send_command` always accepts and records
//! the command it received so tests can assert on what the control loop
//! actually sent. `trigger_scenario` swaps in a named scripted world/
//! telemetry pair for demo determinism (§4.5).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use robogate_core::RobogateError;
use robogate_core::interfaces::SendCommandOutcome;
use robogate_core::interfaces::SimulatorClient;
use robogate_core::proposal::ActionProposal;
use robogate_core::telemetry::Telemetry;
use robogate_core::world::World;

/// A named scenario the mock can switch to via `trigger_scenario`.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Telemetry snapshots to replay, one per tick, once this scenario is active.
    pub telemetry: Vec<Telemetry>,
    /// The world snapshot this scenario serves.
    pub world: World,
}

struct MockState {
    telemetry_script: Vec<Telemetry>,
    next_index: usize,
    world: World,
    scenarios: HashMap<String, Scenario>,
    sent_commands: Vec<ActionProposal>,
    fail_next_telemetry: bool,
}

/// Deterministic, in-memory [`SimulatorClient`] for tests and demos.
pub struct MockSimulatorClient {
    state: Mutex<MockState>,
}

impl MockSimulatorClient {
    /// Builds a mock client that replays `telemetry_script` in order, then
    /// holds the last entry once exhausted, serving `world` throughout.
    ///
    /// # Panics
    ///
    /// Panics if `telemetry_script` is empty; a mock with nothing to replay
    /// is a test-authoring bug, not a runtime condition.
    #[must_use]
    pub fn new(telemetry_script: Vec<Telemetry>, world: World) -> Self {
        assert!(!telemetry_script.is_empty(), "telemetry_script must not be empty");
        Self {
            state: Mutex::new(MockState {
                telemetry_script,
                next_index: 0,
                world,
                scenarios: HashMap::new(),
                sent_commands: Vec::new(),
                fail_next_telemetry: false,
            }),
        }
    }

    /// Registers a named scenario that `trigger_scenario` can switch to.
    pub fn register_scenario(&self, name: impl Into<String>, scenario: Scenario) {
        let mut state = self.lock();
        state.scenarios.insert(name.into(), scenario);
    }

    /// Arranges for the next `get_telemetry` call to fail with
    /// [`RobogateError::TransientExternal`], simulating a sim outage.
    pub fn fail_next_telemetry_call(&self) {
        self.lock().fail_next_telemetry = true;
    }

    /// Returns every command the control loop has sent so far, in order.
    #[must_use]
    pub fn sent_commands(&self) -> Vec<ActionProposal> {
        self.lock().sent_commands.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SimulatorClient for MockSimulatorClient {
    async fn get_telemetry(&self) -> Result<Telemetry, RobogateError> {
        let mut state = self.lock();
        if state.fail_next_telemetry {
            state.fail_next_telemetry = false;
            return Err(RobogateError::TransientExternal("mock simulator telemetry outage".to_string()));
        }
        let index = state.next_index.min(state.telemetry_script.len() - 1);
        let telemetry = state.telemetry_script[index].clone();
        if state.next_index < state.telemetry_script.len() {
            state.next_index += 1;
        }
        Ok(telemetry)
    }

    async fn get_world(&self) -> Result<World, RobogateError> {
        Ok(self.lock().world.clone())
    }

    async fn send_command(&self, proposal: &ActionProposal) -> Result<SendCommandOutcome, RobogateError> {
        let mut state = self.lock();
        state.sent_commands.push(proposal.clone());
        Ok(SendCommandOutcome { accepted: true, reason: None })
    }

    async fn trigger_scenario(&self, name: &str) -> Result<(), RobogateError> {
        let mut state = self.lock();
        let Some(scenario) = state.scenarios.get(name).cloned() else {
            return Err(RobogateError::ProtocolMismatch {
                field: "scenario".to_string(),
                detail: format!("unknown scenario `{name}`"),
            });
        };
        state.telemetry_script = scenario.telemetry;
        state.world = scenario.world;
        state.next_index = 0;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use robogate_core::proposal::Intent;
    use robogate_core::telemetry::Zone;
    use robogate_core::world::Rect;

    use super::*;

    fn telemetry_at(x: f64, y: f64) -> Telemetry {
        Telemetry {
            x,
            y,
            theta: 0.0,
            speed: 0.0,
            zone: Zone::Other,
            nearest_obstacle_m: 10.0,
            human_detected: false,
            human_conf: 0.0,
            human_distance_m: 10.0,
            battery: None,
            target: None,
            events: Vec::new(),
        }
    }

    fn empty_world() -> World {
        World {
            geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 },
            zones: Vec::new(),
            obstacles: Vec::new(),
            human: None,
            bays: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replays_the_script_then_holds_the_last_entry() {
        let mock = MockSimulatorClient::new(vec![telemetry_at(0.0, 0.0), telemetry_at(1.0, 0.0)], empty_world());
        assert_eq!(mock.get_telemetry().await.expect("tick 1").x, 0.0);
        assert_eq!(mock.get_telemetry().await.expect("tick 2").x, 1.0);
        assert_eq!(mock.get_telemetry().await.expect("tick 3 holds").x, 1.0);
    }

    #[tokio::test]
    async fn records_every_sent_command() {
        let mock = MockSimulatorClient::new(vec![telemetry_at(0.0, 0.0)], empty_world());
        let proposal = ActionProposal::new(Intent::Stop, "halt");
        mock.send_command(&proposal).await.expect("accepted");
        assert_eq!(mock.sent_commands().len(), 1);
    }

    #[tokio::test]
    async fn fail_next_telemetry_call_fails_exactly_once() {
        let mock = MockSimulatorClient::new(vec![telemetry_at(0.0, 0.0)], empty_world());
        mock.fail_next_telemetry_call();
        assert!(mock.get_telemetry().await.is_err());
        assert!(mock.get_telemetry().await.is_ok());
    }

    #[tokio::test]
    async fn unknown_scenario_is_rejected() {
        let mock = MockSimulatorClient::new(vec![telemetry_at(0.0, 0.0)], empty_world());
        let result = mock.trigger_scenario("no-such-scenario").await;
        assert!(matches!(result, Err(RobogateError::ProtocolMismatch { .. })));
    }
}
