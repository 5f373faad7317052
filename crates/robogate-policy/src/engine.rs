// crates/robogate-policy/src/engine.rs
// ============================================================================
// Module: Robogate Policy Aggregation Engine
// Description: Aggregates catalog hits into one GovernanceDecision (§4.3).
// Purpose: The sole entry point C7/C8 call to govern a proposal.
// Dependencies: robogate-core, robogate-config
// ============================================================================

//! ## Overview
//! [`evaluate`] is pure and side-effect-free: identical inputs always
//! produce a bit-identical [`GovernanceDecision`] (§4.3 "Idempotence"),
//! which the chain-of-trust depends on for reproducibility. It never
//! panics in the non-test path; [`PolicyError`] exists for the one case
//! that is genuinely the caller's fault (a non-finite telemetry field),
//! and even then the caller is expected to map it to
//! `GovernanceDecision::fail_closed` per §7's `PolicyFailureClosed`.

use robogate_config::RiskConfig;
use robogate_config::SafetyConfig;
use robogate_core::Decision;
use robogate_core::GovernanceDecision;
use robogate_core::PolicyState;
use robogate_core::Telemetry;
use robogate_core::proposal::ActionProposal;
use robogate_core::world::World;
use thiserror::Error;

use crate::catalog::Severity;
use crate::catalog::evaluate_all;

/// Errors raised while evaluating a proposal. Per §7, callers map any of
/// these to [`GovernanceDecision::fail_closed`] rather than propagating.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A telemetry or proposal field was non-finite (`NaN`/`Infinity`),
    /// which no policy rule can meaningfully evaluate.
    #[error("non-finite value in field `{field}`")]
    NonFiniteInput {
        /// The offending field name.
        field: String,
    },
}

fn weight_for(severity: Severity, risk: &RiskConfig) -> f64 {
    match severity {
        Severity::High => risk.weight_high,
        Severity::Medium => risk.weight_medium,
        Severity::Low => risk.weight_low,
    }
}

fn check_finite(value: f64, field: &str) -> Result<(), PolicyError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PolicyError::NonFiniteInput { field: field.to_string() })
    }
}

/// Evaluates `proposal` against `telemetry` and `world` under the given
/// thresholds, returning the aggregated governance decision (§4.3).
///
/// Latency budget: this function performs no I/O and completes well under
/// the 10ms typical / 100ms worst-case budget for any realistic obstacle
/// count; see `tests/policy.rs` for a timing assertion.
///
/// # Errors
///
/// Returns [`PolicyError::NonFiniteInput`] if any numeric telemetry or
/// proposal field is `NaN` or infinite.
pub fn evaluate(
    telemetry: &Telemetry,
    proposal: &ActionProposal,
    world: &World,
    safety: &SafetyConfig,
    risk: &RiskConfig,
) -> Result<GovernanceDecision, PolicyError> {
    check_finite(telemetry.x, "telemetry.x")?;
    check_finite(telemetry.y, "telemetry.y")?;
    check_finite(telemetry.human_distance_m, "telemetry.human_distance_m")?;
    check_finite(telemetry.nearest_obstacle_m, "telemetry.nearest_obstacle_m")?;
    if let Some(speed) = proposal.intent.max_speed() {
        check_finite(speed, "proposal.max_speed")?;
    }

    let hits = evaluate_all(telemetry, proposal, world, safety);

    let risk_score = hits
        .iter()
        .fold(0.0_f64, |acc, hit| acc + weight_for(hit.severity, risk).max(hit.risk_floor))
        .clamp(0.0, 1.0);

    let policy_state = hits.iter().map(|hit| hit.state).max().unwrap_or(PolicyState::Safe);

    let has_medium_hit = hits.iter().any(|hit| hit.severity == Severity::Medium);
    let hit_forces_deny = hits.iter().any(|hit| hit.forces_deny);
    let hit_forces_review = hits.iter().any(|hit| hit.forces_review);

    let decision = if hit_forces_deny || risk_score >= risk.deny_min {
        Decision::Denied
    } else if hit_forces_review || (risk_score >= risk.approve_max && has_medium_hit) {
        Decision::NeedsReview
    } else {
        Decision::Approved
    };

    // Deterministic required_action: highest severity first, tie-broken by
    // the catalog's declaration order (PolicyId's derived Ord), matching
    // §4.3 rule 5.
    let required_action = hits
        .iter()
        .min_by_key(|hit| (severity_rank(hit.severity), hit.id))
        .map(|hit| hit.remediation.clone());

    let mut policy_hits: Vec<_> = hits.iter().map(|hit| hit.id).collect();
    policy_hits.sort();
    let reasons = {
        let mut ordered = hits.clone();
        ordered.sort_by_key(|hit| hit.id);
        ordered.into_iter().map(|hit| hit.reason).collect()
    };

    Ok(GovernanceDecision { decision, policy_state, policy_hits, reasons, required_action, risk_score })
}

/// Lower rank = more severe, used to pick the "most specific" remediation.
const fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::High => 0,
        Severity::Medium => 1,
        Severity::Low => 2,
    }
}
