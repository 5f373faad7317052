// crates/robogate-sim/src/lib.rs
// ============================================================================
// Crate: robogate-sim
// Description: The simulator adapter (C5): a networked SimulatorClient plus
//              an in-memory mock for tests.
// ============================================================================

//! # robogate-sim
//!
//! Two [`robogate_core::interfaces::SimulatorClient`] implementations:
//! [`HttpSimulatorClient`] for talking to a real simulator process, and
//! [`MockSimulatorClient`] for deterministic tests and demos. Nothing in
//! this crate knows about policy, the event log, or the control loop — it
//! only turns a `SimulatorClient` call into bytes on the wire, or into a
//! scripted in-memory response.

pub mod errors;
pub mod http_client;
pub mod mock;

pub use errors::SimError;
pub use http_client::HttpSimulatorClient;
pub use http_client::HttpSimulatorConfig;
pub use mock::MockSimulatorClient;
pub use mock::Scenario;
