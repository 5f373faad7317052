// crates/robogate-core/src/governance.rs
// ============================================================================
// Module: Robogate Governance Decisions
// Description: The output type of the policy engine (C3).
// Purpose: Carry a decision, its coarse severity state, and the evidence
//          behind it through the event log and the hub.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`GovernanceDecision`] is produced once per proposal by the policy engine
//! and is otherwise inert data: the policy engine crate owns the evaluation
//! logic, this crate only owns the shape.

use serde::Deserialize;
use serde::Serialize;

/// The catalog of policy rules the engine evaluates (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyId {
    /// Proposal target falls outside the operational geofence.
    Geofence01,
    /// Human within the hard stop radius.
    HumanProx01,
    /// Human within the slow-down radius.
    HumanProx02,
    /// Proposed speed exceeds the current zone's limit.
    SpeedLimit01,
    /// Nearest obstacle is within the collision radius along heading.
    Collision01,
    /// A known obstacle blocks the straight path to the target.
    PathBlocked01,
    /// Battery charge below the low-battery advisory threshold.
    Battery01,
}

/// Coarse severity label accompanying a governance decision.
///
/// Ordered by severity for deterministic aggregation: `Safe < Slow < Replan
/// < Stop`, so [`Ord`] picks the most severe state among a set of hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyState {
    /// No policy hits; proposal is unconstrained.
    Safe,
    /// At least one medium-severity speed constraint is active.
    Slow,
    /// An obstacle requires the agent to produce a new path.
    Replan,
    /// A high-severity hazard requires halting.
    Stop,
}

/// The engine's final verdict on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// The proposal may be executed as-is.
    Approved,
    /// The proposal must not be executed.
    Denied,
    /// The proposal is risky enough to require operator attention, but is
    /// not outright denied.
    NeedsReview,
}

/// The full output of a policy evaluation.
///
/// # Invariants
/// - `risk_score` is clamped to `[0, 1]`.
/// - `policy_state == Stop` implies `decision != Approved` whenever the
///   proposal's execution would increase hazard exposure; enforced by the
///   policy engine's aggregation rules, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceDecision {
    /// Whether the proposal may be executed.
    pub decision: Decision,
    /// Coarse severity label summarizing the decision.
    pub policy_state: PolicyState,
    /// Policy identifiers that fired, in deterministic order.
    pub policy_hits: Vec<PolicyId>,
    /// Human-readable reasons, one per hit, in the same order as `policy_hits`.
    pub reasons: Vec<String>,
    /// The most specific remediation among the hits, if any applies.
    pub required_action: Option<String>,
    /// Aggregated risk score in `[0, 1]`.
    pub risk_score: f64,
}

impl GovernanceDecision {
    /// Returns the trivially safe decision: no hits, fully approved.
    #[must_use]
    pub fn safe() -> Self {
        Self {
            decision: Decision::Approved,
            policy_state: PolicyState::Safe,
            policy_hits: Vec::new(),
            reasons: Vec::new(),
            required_action: None,
            risk_score: 0.0,
        }
    }

    /// The fail-closed decision used when the engine itself errors (§7
    /// `PolicyFailureClosed`).
    #[must_use]
    pub fn fail_closed() -> Self {
        Self {
            decision: Decision::Denied,
            policy_state: PolicyState::Stop,
            policy_hits: Vec::new(),
            reasons: vec!["engine_error".to_string()],
            required_action: Some("halt".to_string()),
            risk_score: 1.0,
        }
    }
}
