// crates/robogate-core/src/lib.rs
// ============================================================================
// Crate: robogate-core
// Description: Shared data model, canonical hashing, and cross-crate
//              interfaces for the Robogate runtime governance layer.
// Purpose: Give every other crate in the workspace one vocabulary for
//          telemetry, proposals, decisions, events, runs, and the error
//          taxonomy, so they never redefine these shapes independently.
// ============================================================================

//! # robogate-core
//!
//! Data model and interface definitions shared across the Robogate
//! workspace: the runtime governance layer that sits between an autonomous
//! robot's action planner and its actuators. This crate has no I/O of its
//! own; it defines the shapes and traits that the policy, agent, sim,
//! eventlog, hub, and runtime crates implement or consume.

pub mod errors;
pub mod event;
pub mod governance;
pub mod hashing;
pub mod identifiers;
pub mod interfaces;
pub mod proposal;
pub mod run;
pub mod telemetry;
pub mod testing;
pub mod time;
pub mod world;

pub use errors::RobogateError;
pub use event::Event;
pub use event::EventPayload;
pub use event::EventType;
pub use governance::Decision;
pub use governance::GovernanceDecision;
pub use governance::PolicyId;
pub use governance::PolicyState;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::EventId;
pub use identifiers::MissionId;
pub use identifiers::RunId;
pub use identifiers::SubscriberId;
pub use interfaces::ChainVerification;
pub use interfaces::EventLogStore;
pub use interfaces::Hub;
pub use interfaces::HubMessage;
pub use interfaces::HubReceiver;
pub use interfaces::SendCommandOutcome;
pub use interfaces::SimulatorClient;
pub use proposal::ActionProposal;
pub use proposal::Intent;
pub use run::Mission;
pub use run::Run;
pub use run::RunStatus;
pub use telemetry::Point2;
pub use telemetry::Telemetry;
pub use telemetry::Zone;
pub use testing::InMemoryEventLogStore;
pub use time::MonotonicClock;
pub use time::Timestamp;
pub use world::Bay;
pub use world::NamedZone;
pub use world::Obstacle;
pub use world::Rect;
pub use world::World;
