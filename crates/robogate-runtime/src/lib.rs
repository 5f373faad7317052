// crates/robogate-runtime/src/lib.rs
// ============================================================================
// Crate: robogate-runtime
// Description: The per-run control loop, run registry, stagnation detector,
//              and Decision API facade (C7, C8).
// Purpose: Wire the policy engine, agent, simulator adapter, event log, and
//          broadcast hub into the propose -> govern -> execute -> append ->
//          broadcast cycle (§2), and expose the synchronous facade
//          endpoints that compose those same collaborators without a
//          running loop (§4.8).
// ============================================================================

//! # robogate-runtime
//!
//! This crate owns no storage or transport of its own: every collaborator
//! it drives ([`robogate_core::interfaces::SimulatorClient`],
//! [`robogate_core::interfaces::EventLogStore`], [`robogate_core::interfaces::Hub`])
//! is received as a trait object, so the control loop and facade can be
//! exercised in tests against in-memory mocks with no network or disk
//! access (§9 "explicit registry").

pub mod control_loop;
pub mod errors;
pub mod facade;
pub mod ids;
pub mod registry;
pub mod stagnation;

pub use control_loop::LoopOutcome;
pub use control_loop::run_control_loop;
pub use errors::RunServiceError;
pub use facade::DecisionFacade;
pub use facade::PlanExecuteOutcome;
pub use facade::PlanGenerateOutcome;
pub use facade::PlanStepOutcome;
pub use facade::PlanWaypoint;
pub use ids::IdGenerator;
pub use registry::RunHandle;
pub use registry::RunRegistry;
pub use stagnation::StagnationDetector;
pub use stagnation::StagnationOutcome;
