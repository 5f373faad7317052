// crates/robogate-policy/src/lib.rs
// ============================================================================
// Crate: robogate-policy
// Description: The deterministic, side-effect-free policy/governance engine
//              (C3): a pure function from (telemetry, proposal, world,
//              config) to a GovernanceDecision.
// ============================================================================

//! Robogate's policy engine.
//!
//! This crate contains no I/O, no async runtime, and no mutable state: every
//! public function is a pure transform so that a decision can be replayed
//! byte-for-byte from the event log alone. Callers (the runtime crate) own
//! wiring this into the control loop and persisting the result.

pub mod catalog;
pub mod engine;

pub use catalog::PolicyHit;
pub use catalog::Severity;
pub use engine::PolicyError;
pub use engine::evaluate;
