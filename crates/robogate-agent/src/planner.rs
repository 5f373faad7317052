// crates/robogate-agent/src/planner.rs
// ============================================================================
// Module: Deterministic Planner
// Description: The rule-based planner mode (§4.4.a): arrive/stop/slow/wait/
//              replan-with-perpendicular-offset.
// Dependencies: robogate-core, robogate-config
// ============================================================================

//! ## Overview
//! [`plan_tick`] is the fallback planner used whenever no LLM-backed
//! [`crate::provider::PlannerProvider`] is configured, and is also what
//! [`crate::provider::MockPlannerProvider`] calls internally to produce
//! candidates inside the agentic loop. Deviates from spec.md's literal
//! `(telemetry, goal, last_governance?)` signature by also taking `world`:
//! the replan branch needs obstacle geometry to compute a detour waypoint,
//! which no other input carries.

use robogate_config::SafetyConfig;
use robogate_core::GovernanceDecision;
use robogate_core::PolicyState;
use robogate_core::proposal::ActionProposal;
use robogate_core::proposal::Intent;
use robogate_core::telemetry::Point2;
use robogate_core::telemetry::Telemetry;
use robogate_core::world::World;

/// Produces one proposal for the current tick, following the deterministic
/// planner rules.
///
/// `replan_attempt` counts how many replans have already been tried within
/// the current tick window; once it reaches `safety.max_replans` the
/// planner gives up and proposes `STOP` rather than looping forever.
#[must_use]
pub fn plan_tick(
    telemetry: &Telemetry,
    world: &World,
    goal: Point2,
    last_governance: Option<&GovernanceDecision>,
    safety: &SafetyConfig,
    replan_attempt: u32,
) -> ActionProposal {
    let position = telemetry.position();
    if position.distance_to(goal) <= safety.arrive_eps {
        return ActionProposal::new(Intent::Stop, "arrived within tolerance of the goal");
    }

    if let Some(governance) = last_governance {
        match governance.policy_state {
            PolicyState::Stop => {
                return ActionProposal::new(Intent::Wait, "holding position, policy state is STOP");
            }
            PolicyState::Replan => {
                if replan_attempt >= safety.max_replans {
                    return ActionProposal::new(Intent::Stop, "replan attempts exhausted for this tick window");
                }
                let waypoint = detour_waypoint(world, position, goal, safety.detour_offset_m);
                return ActionProposal::new(
                    Intent::MoveTo { x: waypoint.x, y: waypoint.y, max_speed: safety.default_speed },
                    "replanning around a blocking obstacle",
                );
            }
            PolicyState::Slow => {
                return ActionProposal::new(
                    Intent::MoveTo { x: goal.x, y: goal.y, max_speed: safety.slow_speed },
                    "slowing down near a detected human",
                );
            }
            PolicyState::Safe => {}
        }
    }

    ActionProposal::new(Intent::MoveTo { x: goal.x, y: goal.y, max_speed: safety.default_speed }, "cruising toward goal")
}

/// Computes a waypoint offset perpendicular to the bearing toward the
/// nearest obstacle, biased toward whichever side keeps the robot closer
/// to `goal`.
fn detour_waypoint(world: &World, position: Point2, goal: Point2, detour_offset_m: f64) -> Point2 {
    let Some(obstacle) = world.nearest_obstacle(position) else {
        return goal;
    };
    let center = obstacle.center();
    let (dx, dy) = (center.x - position.x, center.y - position.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f64::EPSILON {
        return goal;
    }
    let (ux, uy) = (dx / len, dy / len);
    // Two perpendicular candidates; pick the one nearer the goal.
    let left = Point2::new(center.x - uy * detour_offset_m, center.y + ux * detour_offset_m);
    let right = Point2::new(center.x + uy * detour_offset_m, center.y - ux * detour_offset_m);
    if left.distance_to(goal) <= right.distance_to(goal) { left } else { right }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]
mod tests {
    use robogate_core::world::Obstacle;
    use robogate_core::world::Rect;

    use super::*;

    fn telemetry_at(x: f64, y: f64) -> Telemetry {
        Telemetry {
            x,
            y,
            theta: 0.0,
            speed: 0.0,
            zone: robogate_core::telemetry::Zone::Other,
            nearest_obstacle_m: 10.0,
            human_detected: false,
            human_conf: 0.0,
            human_distance_m: 10.0,
            battery: None,
            target: None,
            events: Vec::new(),
        }
    }

    fn empty_world() -> World {
        World {
            geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 },
            zones: Vec::new(),
            obstacles: Vec::new(),
            human: None,
            bays: Vec::new(),
        }
    }

    #[test]
    fn proposes_stop_when_within_arrive_epsilon() {
        let safety = SafetyConfig::default();
        let telemetry = telemetry_at(5.0, 5.0);
        let proposal = plan_tick(&telemetry, &empty_world(), Point2::new(5.1, 5.0), None, &safety, 0);
        assert_eq!(proposal.intent, Intent::Stop);
    }

    #[test]
    fn proposes_move_to_goal_at_default_speed_absent_prior_governance() {
        let safety = SafetyConfig::default();
        let telemetry = telemetry_at(0.0, 0.0);
        let proposal = plan_tick(&telemetry, &empty_world(), Point2::new(10.0, 0.0), None, &safety, 0);
        assert_eq!(proposal.intent.max_speed(), Some(safety.default_speed));
    }

    #[test]
    fn proposes_wait_when_last_governance_is_stop() {
        let safety = SafetyConfig::default();
        let telemetry = telemetry_at(0.0, 0.0);
        let governance = GovernanceDecision { policy_state: PolicyState::Stop, ..GovernanceDecision::safe() };
        let proposal = plan_tick(&telemetry, &empty_world(), Point2::new(10.0, 0.0), Some(&governance), &safety, 0);
        assert_eq!(proposal.intent, Intent::Wait);
    }

    #[test]
    fn proposes_slow_speed_when_last_governance_is_slow() {
        let safety = SafetyConfig::default();
        let telemetry = telemetry_at(0.0, 0.0);
        let governance = GovernanceDecision { policy_state: PolicyState::Slow, ..GovernanceDecision::safe() };
        let proposal = plan_tick(&telemetry, &empty_world(), Point2::new(10.0, 0.0), Some(&governance), &safety, 0);
        assert_eq!(proposal.intent.max_speed(), Some(safety.slow_speed));
    }

    #[test]
    fn replan_detours_around_the_nearest_obstacle() {
        let safety = SafetyConfig::default();
        let telemetry = telemetry_at(0.0, 0.0);
        let world = World {
            geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 },
            zones: Vec::new(),
            obstacles: vec![Obstacle { x: 5.0, y: 0.0, r: 0.3 }],
            human: None,
            bays: Vec::new(),
        };
        let governance = GovernanceDecision { policy_state: PolicyState::Replan, ..GovernanceDecision::safe() };
        let proposal = plan_tick(&telemetry, &world, Point2::new(10.0, 0.0), Some(&governance), &safety, 0);
        let Intent::MoveTo { x, y, .. } = proposal.intent else {
            panic!("expected a MoveTo detour waypoint");
        };
        assert!((x - 5.0).abs() > f64::EPSILON || y.abs() > f64::EPSILON);
    }

    #[test]
    fn replan_gives_up_and_stops_once_attempts_are_exhausted() {
        let safety = SafetyConfig::default();
        let telemetry = telemetry_at(0.0, 0.0);
        let governance = GovernanceDecision { policy_state: PolicyState::Replan, ..GovernanceDecision::safe() };
        let proposal =
            plan_tick(&telemetry, &empty_world(), Point2::new(10.0, 0.0), Some(&governance), &safety, safety.max_replans);
        assert_eq!(proposal.intent, Intent::Stop);
    }
}
