// crates/robogate-core/src/interfaces.rs
// ============================================================================
// Module: Robogate Cross-Crate Interfaces
// Description: Backend-agnostic traits implemented by the sim and eventlog
//              crates and consumed by the runtime crate.
// Purpose: Let the runtime crate depend on behavior, not on concrete
//          simulator or storage implementations, so tests can substitute
//          mocks (§4.5, §4.2).
// Dependencies: async-trait, serde
// ============================================================================

//! ## Overview
//! These traits are the seams named in §9 ("global task table → explicit
//! registry" and the general push toward explicit result types): the
//! runtime crate's control loop is written once against [`SimulatorClient`]
//! and [`EventLogStore`], and is exercised in tests against in-memory/mock
//! implementations with no network or disk access.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::RobogateError;
use crate::event::Event;
use crate::event::EventPayload;
use crate::identifiers::RunId;
use crate::identifiers::SubscriberId;
use crate::proposal::ActionProposal;
use crate::run::RunStatus;
use crate::telemetry::Telemetry;
use crate::world::World;

/// The simulator's response to a command (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendCommandOutcome {
    /// Whether the simulator accepted the command.
    pub accepted: bool,
    /// Rejection reason, if `accepted` is false.
    #[serde(default)]
    pub reason: Option<String>,
}

/// The interface consumed from the simulator (C5), implemented by the sim crate.
///
/// All calls are idempotent except [`SimulatorClient::send_command`] (§4.5).
#[async_trait]
pub trait SimulatorClient: Send + Sync {
    /// Fetches the current telemetry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`] on timeout or a 5xx
    /// response.
    async fn get_telemetry(&self) -> Result<Telemetry, RobogateError>;

    /// Fetches the current world snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`] on timeout or a 5xx
    /// response.
    async fn get_world(&self) -> Result<World, RobogateError>;

    /// Sends an approved proposal to the simulator for execution.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`] on timeout or a 5xx
    /// response.
    async fn send_command(&self, proposal: &ActionProposal) -> Result<SendCommandOutcome, RobogateError>;

    /// Triggers a named demo scenario, for reproducible end-to-end tests.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`] on timeout or a 5xx
    /// response.
    async fn trigger_scenario(&self, name: &str) -> Result<(), RobogateError>;
}

/// The result of verifying a run's hash chain (C2 `verify`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether the chain verified cleanly.
    pub ok: bool,
    /// The first sequence number whose linkage is broken, if any.
    pub break_at: Option<u64>,
}

/// The event log interface (C2), implemented by the eventlog-sqlite crate.
#[async_trait]
pub trait EventLogStore: Send + Sync {
    /// Appends a new event to `run_id`'s chain, allocating the next `seq`
    /// and linking to the previous event's hash.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::ConcurrentAppend`] if another appender raced
    /// on the same run (retried once by the caller under single-writer
    /// discipline, §4.2) or [`RobogateError::Fatal`] on storage failure.
    async fn append(&self, run_id: &RunId, payload: EventPayload) -> Result<Event, RobogateError>;

    /// Lists events for `run_id` in ascending `seq` order, optionally
    /// starting after `since_seq`.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::Fatal`] on storage failure.
    async fn list(&self, run_id: &RunId, since_seq: Option<u64>) -> Result<Vec<Event>, RobogateError>;

    /// Recomputes hashes and prev-links for `run_id`'s chain.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::Fatal`] on storage failure.
    async fn verify(&self, run_id: &RunId) -> Result<ChainVerification, RobogateError>;
}

/// A fan-out message delivered to broadcast-hub subscribers (§4.6).
///
/// Carries the same `{kind, data}` shape the spec's WebSocket frames use;
/// `kind` is the enum's tag on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum HubMessage {
    /// A sampled telemetry snapshot.
    Telemetry(Telemetry),
    /// A full event-log entry.
    Event(Event),
    /// An operator-facing alert, recoverable or fatal.
    Alert {
        /// Coarse alert category, e.g. `"loop_error"`, `"chain_break"`.
        kind: String,
        /// Human-readable detail.
        message: String,
        /// Structured detail, if any.
        #[serde(default)]
        details: Option<serde_json::Value>,
    },
    /// A run lifecycle transition.
    Status(RunStatus),
    /// A step of the agentic reasoning loop, surfaced live for observers.
    AgentReasoning {
        /// Short label for this reasoning step, e.g. `"tool_call"`.
        step: String,
        /// Human-readable detail for this step.
        detail: String,
    },
}

/// A subscriber's bounded, drop-oldest-on-overflow message queue (§4.6).
///
/// A plain `tokio::sync::mpsc::Receiver` cannot have its oldest buffered
/// item evicted from the sending side, so the hub stores messages in this
/// `VecDeque` directly and uses a capacity-1 `mpsc` channel purely as a
/// doorbell to wake a waiting [`HubReceiver::recv`]. Coalesced or stale
/// doorbell wakeups are harmless: `recv` always re-checks the queue before
/// waiting again.
pub struct HubReceiver {
    /// Shared with the hub's publisher side; guarded independently of the
    /// subscriber registry lock so publish and receive never contend.
    queue: Arc<Mutex<VecDeque<HubMessage>>>,
    /// Signals "the queue may be non-empty"; closed by the hub on eviction
    /// or explicit unsubscribe, which ends this receiver's stream.
    doorbell: tokio::sync::mpsc::Receiver<()>,
}

impl HubReceiver {
    /// Builds a receiver over a queue/doorbell pair owned by the hub.
    #[must_use]
    pub fn new(queue: Arc<Mutex<VecDeque<HubMessage>>>, doorbell: tokio::sync::mpsc::Receiver<()>) -> Self {
        Self { queue, doorbell }
    }

    /// Waits for and returns the next message, or `None` once the hub has
    /// dropped this subscriber (evicted or explicitly unsubscribed).
    pub async fn recv(&mut self) -> Option<HubMessage> {
        loop {
            let next = self.queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
            if let Some(message) = next {
                return Some(message);
            }
            self.doorbell.recv().await?;
        }
    }
}

/// The per-run broadcast fan-out interface (C6), implemented by the hub crate.
///
/// Delivery is best-effort per subscriber: messages to a given subscriber
/// arrive in publish order, but a slow subscriber may have older messages
/// dropped, and there is no ordering guarantee across subscribers (§4.6).
pub trait Hub: Send + Sync {
    /// Subscribes to `run_id`'s broadcast stream, returning the new
    /// subscriber's id and a receiver for its bounded message buffer.
    fn subscribe(&self, run_id: &RunId) -> (SubscriberId, HubReceiver);

    /// Removes a subscriber, dropping its sender side and closing its
    /// receiver. A no-op if the subscriber is already gone.
    fn unsubscribe(&self, run_id: &RunId, subscriber_id: SubscriberId);

    /// Publishes `message` to every current subscriber of `run_id`.
    ///
    /// Non-blocking per subscriber: a subscriber whose buffer is full has
    /// its oldest message dropped to make room, per §4.6.
    fn publish(&self, run_id: &RunId, message: HubMessage);
}
