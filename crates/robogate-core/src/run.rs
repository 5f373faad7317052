// crates/robogate-core/src/run.rs
// ============================================================================
// Module: Robogate Runs and Missions
// Description: The run row and the external mission record it belongs to.
// Purpose: Track per-run lifecycle status and the navigation goal driving it.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Run`] is one execution of a [`Mission`]'s control loop. Missions are
//! an external collaborator (§1): only their shape matters here, not their
//! CRUD semantics, which belong to the server crate.

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::MissionId;
use crate::identifiers::RunId;
use crate::telemetry::Point2;
use crate::time::Timestamp;

/// A run's lifecycle state.
///
/// # Invariants
/// - `Running` may transition to any terminal state.
/// - Terminal states (`Stopped`, `Completed`, `Failed`) never transition
///   again; see [`RunStatus::is_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The control loop is actively ticking.
    Running,
    /// The loop was stopped on operator request.
    Stopped,
    /// The loop reached the mission goal and proposed/approved `STOP`.
    Completed,
    /// The loop terminated on an unrecoverable fault.
    Failed,
}

impl RunStatus {
    /// Returns whether this status is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Returns whether transitioning from `self` to `next` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(self, Self::Running) && !matches!(next, Self::Running)
    }
}

/// One execution of a mission's control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique run identifier.
    pub id: RunId,
    /// The mission this run is executing.
    pub mission_id: MissionId,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// When the run's loop task was spawned.
    pub started_at: Timestamp,
    /// When the run reached a terminal status, if it has.
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
}

impl Run {
    /// Creates a freshly started run.
    #[must_use]
    pub fn start(id: RunId, mission_id: MissionId, started_at: Timestamp) -> Self {
        Self { id, mission_id, status: RunStatus::Running, started_at, ended_at: None }
    }

    /// Attempts to transition to a terminal status, stamping `ended_at`.
    ///
    /// Returns `false` without modifying `self` if the transition is not
    /// permitted (§3 invariant: terminal states never re-open).
    #[must_use]
    pub fn transition_to(&mut self, next: RunStatus, ended_at: Timestamp) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.ended_at = Some(ended_at);
        true
    }
}

/// An external mission record; CRUD semantics live in the server crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Unique mission identifier.
    pub id: MissionId,
    /// Natural-language goal description, consumed by the agent as context.
    pub title: String,
    /// Navigation goal the mission's runs drive toward.
    pub goal: Point2,
}
