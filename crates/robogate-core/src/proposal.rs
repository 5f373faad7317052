// crates/robogate-core/src/proposal.rs
// ============================================================================
// Module: Robogate Action Proposals
// Description: Planner-produced candidate actions, pre-governance.
// Purpose: Give the policy engine a closed, strictly typed action surface.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`ActionProposal`] is a planner's candidate action before it has been
//! evaluated by the policy engine. `intent` is a closed tagged union (§9
//! "dynamic payloads"): unknown intents are rejected at the deserialization
//! boundary rather than accepted and dropped downstream.

use serde::Deserialize;
use serde::Serialize;

/// A candidate action awaiting governance.
///
/// # Invariants
/// - `rationale` is never empty for proposals produced by the agent crate;
///   this type itself does not enforce that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProposal {
    /// The proposed action and its parameters.
    #[serde(flatten)]
    pub intent: Intent,
    /// Human-readable justification, shown to operators.
    pub rationale: String,
}

impl ActionProposal {
    /// Builds a proposal from an intent and rationale.
    #[must_use]
    pub fn new(intent: Intent, rationale: impl Into<String>) -> Self {
        Self { intent, rationale: rationale.into() }
    }
}

/// The closed set of actions a proposal may request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "params", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Move toward `(x, y)` at no more than `max_speed`.
    MoveTo {
        /// Target x, meters.
        x: f64,
        /// Target y, meters.
        y: f64,
        /// Speed cap for this motion, m/s.
        max_speed: f64,
    },
    /// Halt immediately.
    Stop,
    /// Hold position for one tick and re-propose next tick.
    Wait,
    /// Keep the current target but change the speed cap.
    ModifySpeed {
        /// New speed cap, m/s.
        max_speed: f64,
    },
}

impl Intent {
    /// Returns the requested speed cap, if this intent carries one.
    #[must_use]
    pub const fn max_speed(&self) -> Option<f64> {
        match self {
            Self::MoveTo { max_speed, .. } | Self::ModifySpeed { max_speed } => Some(*max_speed),
            Self::Stop | Self::Wait => None,
        }
    }

    /// Returns the requested target, if this intent carries one.
    #[must_use]
    pub const fn target(&self) -> Option<(f64, f64)> {
        match self {
            Self::MoveTo { x, y, .. } => Some((*x, *y)),
            Self::Stop | Self::Wait | Self::ModifySpeed { .. } => None,
        }
    }

    /// Returns a new `MoveTo`/`ModifySpeed` intent with `max_speed` replaced,
    /// leaving other intents unchanged.
    #[must_use]
    pub fn with_max_speed(&self, new_speed: f64) -> Self {
        match self {
            Self::MoveTo { x, y, .. } => Self::MoveTo { x: *x, y: *y, max_speed: new_speed },
            Self::ModifySpeed { .. } => Self::ModifySpeed { max_speed: new_speed },
            Self::Stop => Self::Stop,
            Self::Wait => Self::Wait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_max_speed_rewrites_move_to_speed_only() {
        let intent = Intent::MoveTo { x: 1.0, y: 2.0, max_speed: 0.8 };
        let reduced = intent.with_max_speed(0.3);
        assert_eq!(reduced, Intent::MoveTo { x: 1.0, y: 2.0, max_speed: 0.3 });
    }

    #[test]
    fn stop_and_wait_carry_no_target_or_speed() {
        assert_eq!(Intent::Stop.target(), None);
        assert_eq!(Intent::Wait.max_speed(), None);
    }
}
