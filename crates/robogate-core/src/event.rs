// crates/robogate-core/src/event.rs
// ============================================================================
// Module: Robogate Events
// Description: Immutable, hash-chained records appended to a run's log.
// Purpose: Give the event log (C2) a strictly typed, closed payload schema.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every [`Event`] is immutable once appended. `payload` is a closed tagged
//! union keyed by `type` (§9): unknown event types are rejected at the
//! deserialization boundary, never silently accepted. The event's `hash`
//! covers the canonical JSON of `{seq, run_id, ts, type, payload, prev_hash}`
//! (§3); computing and linking that hash is the event log crate's job, not
//! this type's.

use serde::Deserialize;
use serde::Serialize;

use crate::governance::GovernanceDecision;
use crate::hashing::HashDigest;
use crate::identifiers::EventId;
use crate::identifiers::RunId;
use crate::proposal::ActionProposal;
use crate::telemetry::Telemetry;
use crate::time::Timestamp;

/// The closed set of event types recorded in a run's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A sampled telemetry snapshot.
    Telemetry,
    /// A governance decision on a proposal.
    Decision,
    /// The outcome of sending an approved command to the simulator.
    Execution,
    /// A stagnation detector trip.
    Stagnation,
    /// A waypoint plan produced by the plan-execution facade (§9).
    Plan,
    /// An operator-facing alert, recoverable or fatal.
    Alert,
}

/// The command actually sent to the simulator for an approved proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedCommand {
    /// The proposal's intent tag, duplicated here for queryability.
    pub intent: String,
    /// The intent's parameters as sent to the simulator.
    pub params: serde_json::Value,
}

/// The simulator's response to a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the simulator accepted the command.
    pub accepted: bool,
    /// Rejection reason, if `accepted` is false.
    #[serde(default)]
    pub reason: Option<String>,
}

/// The telemetry and goal context a decision was made against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Telemetry snapshot the proposal was evaluated against.
    pub telemetry: Telemetry,
    /// The run's current navigation goal.
    pub mission_goal: crate::telemetry::Point2,
}

/// A single waypoint step recorded by the plan-execution facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Index of this waypoint within the plan.
    pub waypoint_index: usize,
    /// Whether this waypoint's command was actually executed.
    pub executed: bool,
    /// The governance decision for this waypoint.
    pub governance_decision: GovernanceDecision,
}

/// The type-specific body of an event, tagged by [`EventType`] on the wire.
///
/// Serializes with `type` and `payload` as sibling fields, matching the
/// on-disk schema in §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// A sampled telemetry snapshot.
    Telemetry(Telemetry),
    /// A governance decision on a proposal.
    Decision {
        /// Telemetry/goal context at decision time.
        context: DecisionContext,
        /// The proposal that was evaluated.
        proposal: ActionProposal,
        /// The resulting governance decision.
        governance: GovernanceDecision,
    },
    /// The outcome of sending an approved command to the simulator.
    Execution {
        /// The command sent.
        command: ExecutedCommand,
        /// The simulator's response.
        result: CommandResult,
    },
    /// A stagnation detector trip.
    Stagnation {
        /// Consecutive low-progress ticks observed before this event.
        stagnant_cycles: u32,
        /// Remaining distance to the goal at trip time.
        goal_distance: f64,
    },
    /// A waypoint plan produced by the plan-execution facade.
    Plan {
        /// Per-waypoint execution outcomes.
        steps: Vec<PlanStep>,
    },
    /// An operator-facing alert.
    Alert {
        /// Coarse alert category, e.g. `"loop_error"`, `"chain_break"`.
        kind: String,
        /// Human-readable detail.
        message: String,
        /// Structured detail, if any.
        #[serde(default)]
        details: Option<serde_json::Value>,
    },
}

impl EventPayload {
    /// Returns the [`EventType`] tag for this payload.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Telemetry(_) => EventType::Telemetry,
            Self::Decision { .. } => EventType::Decision,
            Self::Execution { .. } => EventType::Execution,
            Self::Stagnation { .. } => EventType::Stagnation,
            Self::Plan { .. } => EventType::Plan,
            Self::Alert { .. } => EventType::Alert,
        }
    }
}

/// An immutable, hash-chained record in a run's event log.
///
/// # Invariants
/// - `seq` is contiguous from 1 within a run.
/// - `prev_hash` equals the previous event's `hash`, or the all-zero genesis
///   digest for `seq == 1`.
/// - `hash` equals `sha256(canonical_json({seq, run_id, ts, type, payload, prev_hash}))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Strictly increasing sequence number within the run, starting at 1.
    pub seq: u64,
    /// Opaque unique identifier for this event.
    pub id: EventId,
    /// The run this event belongs to.
    pub run_id: RunId,
    /// UTC timestamp, monotonic within the run (§5).
    pub ts: Timestamp,
    /// The type-specific payload.
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Hash of the previous event in this run's chain.
    pub prev_hash: HashDigest,
    /// Hash of this event, covering everything but itself.
    pub hash: HashDigest,
}

impl Event {
    /// The fields hashed to produce this event's `hash`: everything in the
    /// event except `hash` itself.
    #[must_use]
    pub fn hash_preimage(&self) -> EventHashPreimage<'_> {
        EventHashPreimage {
            seq: self.seq,
            run_id: &self.run_id,
            ts: self.ts,
            payload: &self.payload,
            prev_hash: &self.prev_hash,
        }
    }
}

/// Borrowed view of the fields covered by [`Event::hash`], used so the event
/// log crate can recompute and compare hashes without cloning.
#[derive(Serialize)]
pub struct EventHashPreimage<'a> {
    /// Sequence number, see [`Event::seq`].
    seq: u64,
    /// Run identifier, see [`Event::run_id`].
    run_id: &'a RunId,
    /// Timestamp, see [`Event::ts`].
    ts: Timestamp,
    /// Type-specific payload, see [`Event::payload`].
    #[serde(flatten)]
    payload: &'a EventPayload,
    /// Previous event's hash, see [`Event::prev_hash`].
    prev_hash: &'a HashDigest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_payload_reports_its_own_type() {
        let payload = EventPayload::Alert {
            kind: "loop_error".to_string(),
            message: "sim timeout".to_string(),
            details: None,
        };
        assert_eq!(payload.event_type(), EventType::Alert);
    }
}
