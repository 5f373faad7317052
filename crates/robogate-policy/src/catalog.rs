// crates/robogate-policy/src/catalog.rs
// ============================================================================
// Module: Robogate Policy Catalog
// Description: The seven fixed safety rules evaluated against a proposal.
// Purpose: Isolate each rule's violation condition and remediation from the
//          aggregation logic in engine.rs, so each can be tested in isolation.
// Dependencies: robogate-core
// ============================================================================

//! ## Overview
//! Each function below evaluates one policy and returns `Some(PolicyHit)` on
//! violation, `None` otherwise. None of these functions perform I/O or carry
//! state; see engine.rs for how hits are aggregated into a decision.

use robogate_config::SafetyConfig;
use robogate_core::PolicyId;
use robogate_core::PolicyState;
use robogate_core::Telemetry;
use robogate_core::proposal::ActionProposal;
use robogate_core::proposal::Intent;
use robogate_core::world::World;

/// Coarse severity, driving both the risk-weight lookup and decision floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Forces a deny-level decision floor.
    High,
    /// Forces a needs-review-level decision floor.
    Medium,
    /// Advisory only; contributes risk but no decision floor by itself.
    Low,
}

/// A single policy violation, carrying everything the aggregator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyHit {
    /// Which policy fired.
    pub id: PolicyId,
    /// The hit's severity.
    pub severity: Severity,
    /// Human-readable reason, surfaced in `GovernanceDecision::reasons`.
    pub reason: String,
    /// The coarse state this hit contributes toward the aggregate `policy_state`.
    pub state: PolicyState,
    /// Whether this hit alone forces the proposal to be denied outright.
    pub forces_deny: bool,
    /// Whether this hit alone forces at least a needs-review outcome.
    pub forces_review: bool,
    /// A minimum risk-score contribution this hit guarantees, overriding the
    /// configured severity weight when higher (§4.3 catalog floors).
    pub risk_floor: f64,
    /// The remediation text for this hit, used by [`crate::engine::evaluate`]
    /// to build `required_action`.
    pub remediation: String,
}

/// `GEOFENCE_01`: the proposal's target lies outside the operational geofence.
#[must_use]
pub fn geofence_01(proposal: &ActionProposal, world: &World) -> Option<PolicyHit> {
    let (x, y) = proposal.intent.target()?;
    if world.geofence.contains(robogate_core::telemetry::Point2::new(x, y)) {
        return None;
    }
    Some(PolicyHit {
        id: PolicyId::Geofence01,
        severity: Severity::High,
        reason: format!("target ({x}, {y}) is outside the operational geofence"),
        state: PolicyState::Stop,
        forces_deny: true,
        forces_review: true,
        risk_floor: 1.0,
        remediation: "halt".to_string(),
    })
}

/// `HUMAN_PROX_01`: a human is within the hard stop radius.
///
/// Uses `<=` rather than the catalog table's `<` so that a human at exactly
/// `stop_radius_m` still halts the robot (§8 boundary test).
#[must_use]
pub fn human_prox_01(telemetry: &Telemetry, safety: &SafetyConfig) -> Option<PolicyHit> {
    if !telemetry.human_detected || telemetry.human_distance_m > safety.stop_radius_m {
        return None;
    }
    Some(PolicyHit {
        id: PolicyId::HumanProx01,
        severity: Severity::High,
        reason: format!(
            "human detected at {:.2}m, within stop radius {:.2}m",
            telemetry.human_distance_m, safety.stop_radius_m
        ),
        state: PolicyState::Stop,
        forces_deny: true,
        forces_review: true,
        risk_floor: 0.9,
        remediation: "halt".to_string(),
    })
}

/// `HUMAN_PROX_02`: a human is within the slow-down radius but outside the
/// hard stop radius. The hit always fires at this distance; whether it
/// forces review depends on whether the proposal already complies with
/// `slow_speed`.
#[must_use]
pub fn human_prox_02(telemetry: &Telemetry, proposal: &ActionProposal, safety: &SafetyConfig) -> Option<PolicyHit> {
    let in_slow_band = telemetry.human_distance_m > safety.stop_radius_m && telemetry.human_distance_m < safety.slow_radius_m;
    if !telemetry.human_detected || !in_slow_band {
        return None;
    }
    let compliant = proposal.intent.max_speed().is_none_or(|speed| speed <= safety.slow_speed);
    Some(PolicyHit {
        id: PolicyId::HumanProx02,
        severity: Severity::Medium,
        reason: format!(
            "human detected at {:.2}m, within slow radius {:.2}m",
            telemetry.human_distance_m, safety.slow_radius_m
        ),
        state: PolicyState::Slow,
        forces_deny: false,
        forces_review: !compliant,
        risk_floor: 0.0,
        remediation: format!("reduce speed to {}", safety.slow_speed),
    })
}

/// Returns the zone speed limit for `zone`.
#[must_use]
pub fn zone_speed_limit(zone: robogate_core::telemetry::Zone, safety: &SafetyConfig) -> Option<f64> {
    match zone {
        robogate_core::telemetry::Zone::Aisle => Some(safety.aisle_speed_limit),
        robogate_core::telemetry::Zone::LoadingBay => Some(safety.loading_bay_speed_limit),
        robogate_core::telemetry::Zone::Other => None,
    }
}

/// `SPEED_LIMIT_01`: the proposed speed exceeds the current zone's limit.
#[must_use]
pub fn speed_limit_01(telemetry: &Telemetry, proposal: &ActionProposal, safety: &SafetyConfig) -> Option<PolicyHit> {
    let limit = zone_speed_limit(telemetry.zone, safety)?;
    let requested = proposal.intent.max_speed()?;
    if requested <= limit {
        return None;
    }
    Some(PolicyHit {
        id: PolicyId::SpeedLimit01,
        severity: Severity::Medium,
        reason: format!("requested speed {requested:.4} exceeds zone limit {limit:.2}"),
        state: PolicyState::Slow,
        forces_deny: false,
        forces_review: true,
        risk_floor: 0.0,
        remediation: format!("reduce speed to {limit:.2}"),
    })
}

/// `COLLISION_01`: the nearest obstacle is within the collision radius.
#[must_use]
pub fn collision_01(telemetry: &Telemetry, safety: &SafetyConfig) -> Option<PolicyHit> {
    if telemetry.nearest_obstacle_m >= safety.collision_radius {
        return None;
    }
    Some(PolicyHit {
        id: PolicyId::Collision01,
        severity: Severity::High,
        reason: format!(
            "nearest obstacle at {:.2}m, within collision radius {:.2}m",
            telemetry.nearest_obstacle_m, safety.collision_radius
        ),
        state: PolicyState::Replan,
        forces_deny: true,
        forces_review: true,
        risk_floor: 0.85,
        remediation: "halt and replan".to_string(),
    })
}

/// Shortest distance from `point` to the segment `a -> b`.
fn point_to_segment_distance(
    point: robogate_core::telemetry::Point2,
    a: robogate_core::telemetry::Point2,
    b: robogate_core::telemetry::Point2,
) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return a.distance_to(point);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let projected = robogate_core::telemetry::Point2::new(a.x + t * dx, a.y + t * dy);
    projected.distance_to(point)
}

/// `PATH_BLOCKED_01`: an obstacle sits too close to the straight path to the
/// proposal's target.
#[must_use]
pub fn path_blocked_01(
    telemetry: &Telemetry,
    proposal: &ActionProposal,
    world: &World,
    safety: &SafetyConfig,
) -> Option<PolicyHit> {
    let (x, y) = proposal.intent.target()?;
    let target = robogate_core::telemetry::Point2::new(x, y);
    let origin = telemetry.position();
    let blocking = world.obstacles.iter().find(|obstacle| {
        let clearance = point_to_segment_distance(obstacle.center(), origin, target) - obstacle.r;
        clearance < safety.min_clearance_m
    })?;
    Some(PolicyHit {
        id: PolicyId::PathBlocked01,
        severity: Severity::Medium,
        reason: format!("obstacle at ({:.2}, {:.2}) blocks the direct path to ({x:.2}, {y:.2})", blocking.x, blocking.y),
        state: PolicyState::Replan,
        forces_deny: true,
        forces_review: true,
        risk_floor: 0.0,
        remediation: format!("replan around obstacle at ({:.2}, {:.2})", blocking.x, blocking.y),
    })
}

/// `BATTERY_01`: battery charge has fallen below the low-battery advisory
/// threshold.
#[must_use]
pub fn battery_01(telemetry: &Telemetry, safety: &SafetyConfig) -> Option<PolicyHit> {
    let battery = telemetry.battery?;
    if battery >= safety.low_battery_threshold {
        return None;
    }
    Some(PolicyHit {
        id: PolicyId::Battery01,
        severity: Severity::Low,
        reason: format!("battery at {:.0}%, below advisory threshold {:.0}%", battery * 100.0, safety.low_battery_threshold * 100.0),
        state: PolicyState::Safe,
        forces_deny: false,
        forces_review: true,
        risk_floor: 0.0,
        remediation: "return to charging bay".to_string(),
    })
}

/// Evaluates the full catalog, returning all hits in deterministic
/// (declaration) order.
#[must_use]
pub fn evaluate_all(telemetry: &Telemetry, proposal: &ActionProposal, world: &World, safety: &SafetyConfig) -> Vec<PolicyHit> {
    let mut hits = Vec::new();
    hits.extend(geofence_01(proposal, world));
    hits.extend(human_prox_01(telemetry, safety));
    hits.extend(human_prox_02(telemetry, proposal, safety));
    hits.extend(speed_limit_01(telemetry, proposal, safety));
    hits.extend(collision_01(telemetry, safety));
    hits.extend(path_blocked_01(telemetry, proposal, world, safety));
    hits.extend(battery_01(telemetry, safety));
    hits
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use robogate_core::telemetry::Zone;

    use super::*;

    fn telemetry(zone: Zone) -> Telemetry {
        Telemetry {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            speed: 0.0,
            zone,
            nearest_obstacle_m: 10.0,
            human_detected: false,
            human_conf: 0.0,
            human_distance_m: 10.0,
            battery: None,
            target: None,
            events: Vec::new(),
        }
    }

    #[test]
    fn human_prox_01_fires_at_exactly_stop_radius() {
        let safety = SafetyConfig::default();
        let mut t = telemetry(Zone::Aisle);
        t.human_detected = true;
        t.human_distance_m = safety.stop_radius_m;
        assert!(human_prox_01(&t, &safety).is_some());
    }

    #[test]
    fn human_prox_01_does_not_fire_just_beyond_stop_radius() {
        let safety = SafetyConfig::default();
        let mut t = telemetry(Zone::Aisle);
        t.human_detected = true;
        t.human_distance_m = safety.stop_radius_m + 0.01;
        assert!(human_prox_01(&t, &safety).is_none());
    }

    #[test]
    fn speed_limit_01_fires_just_over_aisle_limit() {
        let safety = SafetyConfig::default();
        let t = telemetry(Zone::Aisle);
        let proposal = ActionProposal::new(
            Intent::MoveTo { x: 1.0, y: 1.0, max_speed: safety.aisle_speed_limit + 0.0001 },
            "go",
        );
        assert!(speed_limit_01(&t, &proposal, &safety).is_some());
    }

    #[test]
    fn human_prox_02_flags_noncompliant_speed_in_the_slow_band() {
        let safety = SafetyConfig::default();
        let mut t = telemetry(Zone::Aisle);
        t.human_detected = true;
        t.human_distance_m = 2.4;
        let proposal = ActionProposal::new(Intent::MoveTo { x: 10.0, y: 5.0, max_speed: 0.8 }, "go");
        let hit = human_prox_02(&t, &proposal, &safety).expect("hit");
        assert!(hit.forces_review);
        assert_eq!(hit.remediation, "reduce speed to 0.3");
    }

    #[test]
    fn human_prox_02_is_silent_for_compliant_speed_in_the_slow_band() {
        let safety = SafetyConfig::default();
        let mut t = telemetry(Zone::Aisle);
        t.human_detected = true;
        t.human_distance_m = 2.4;
        let proposal = ActionProposal::new(Intent::MoveTo { x: 10.0, y: 5.0, max_speed: 0.3 }, "go");
        let hit = human_prox_02(&t, &proposal, &safety).expect("hit still fires, just not forcing review");
        assert!(!hit.forces_review);
    }

    #[test]
    fn human_prox_02_does_not_fire_inside_the_stop_radius() {
        let safety = SafetyConfig::default();
        let mut t = telemetry(Zone::Aisle);
        t.human_detected = true;
        t.human_distance_m = safety.stop_radius_m;
        assert!(human_prox_02(&t, &ActionProposal::new(Intent::Stop, "halt"), &safety).is_none());
    }

    #[test]
    fn geofence_01_fires_just_outside_the_boundary() {
        let world = World {
            geofence: robogate_core::world::Rect { min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 },
            zones: Vec::new(),
            obstacles: Vec::new(),
            human: None,
            bays: Vec::new(),
        };
        let proposal = ActionProposal::new(Intent::MoveTo { x: -0.0001, y: 5.0, max_speed: 0.3 }, "go");
        assert!(geofence_01(&proposal, &world).is_some());
    }
}
