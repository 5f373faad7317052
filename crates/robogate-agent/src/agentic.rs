// crates/robogate-agent/src/agentic.rs
// ============================================================================
// Module: Agentic Reasoning Loop
// Description: Drives the fixed tool set (§4.4.b) from a PlannerProvider,
//              bounded by max_steps, wall-clock budget, and consecutive
//              denials.
// Purpose: Back the `/agent/propose`-style synchronous API (C8
//          `agentic.propose`) without depending on a running control loop.
// Dependencies: robogate-core, robogate-config, robogate-policy
// ============================================================================

//! ## Overview
//! [`run_agentic_loop`] repeatedly asks a [`PlannerProvider`] for the next
//! tool call and executes it against [`robogate_policy::evaluate`] (for
//! `check_policy`) or the loop's own bookkeeping (for the others). It never
//! appends anything to an event log or talks to a simulator — those are the
//! caller's concern; this loop only produces a final proposal plus the
//! thought chain that led to it.

use std::time::Duration;
use std::time::Instant;

use robogate_config::RiskConfig;
use robogate_config::SafetyConfig;
use robogate_core::GovernanceDecision;
use robogate_core::proposal::ActionProposal;
use robogate_core::proposal::Intent;
use robogate_core::telemetry::Point2;
use robogate_core::telemetry::Telemetry;
use robogate_core::world::World;

use crate::errors::AgentError;
use crate::memory::AgentMemory;
use crate::memory::MemorySummary;
use crate::provider::AgentContext;
use serde::Serialize;

use crate::provider::AgentTool;
use crate::provider::PlannerProvider;

/// One recorded step of the agentic loop's reasoning, shown to operators via
/// the `thought_chain` field of `/agent/propose` (§4.8).
#[derive(Debug, Clone, Serialize)]
pub struct ThoughtStep {
    /// Which step index this was, starting at 0.
    pub step_index: u32,
    /// A human-readable description of the tool call and its outcome.
    pub narration: String,
}

/// The result of one agentic-loop invocation (§4.8 `agentic.propose`).
#[derive(Debug, Clone, Serialize)]
pub struct AgenticOutcome {
    /// The final proposal the loop submitted.
    pub proposal: ActionProposal,
    /// The governance decision for the final proposal, if one was checked.
    pub governance: Option<GovernanceDecision>,
    /// The ordered narration of every tool call made.
    pub thought_chain: Vec<ThoughtStep>,
    /// A rollup of the memory state at the end of the loop.
    pub memory_summary: MemorySummary,
    /// Whether at least one `replan` tool call was issued.
    pub replanning_used: bool,
    /// Identifies which planner backend produced this outcome; the mock
    /// provider always reports `"mock"` (§4.4.b "Determinism under mock").
    pub model_used: String,
}

fn step(thought_chain: &mut Vec<ThoughtStep>, step_index: u32, narration: impl Into<String>) {
    thought_chain.push(ThoughtStep { step_index, narration: narration.into() });
}

/// Runs the agentic reasoning loop to produce one governed proposal.
///
/// # Errors
///
/// Returns [`AgentError::WallClockExceeded`] if the loop exceeds
/// `wall_clock_ms` before terminating via `submit_action`, `graceful_stop`,
/// the forced-stop-on-denials rule, or the `max_steps` cap.
#[allow(clippy::too_many_arguments, reason = "mirrors the tool-loop context every caller must supply")]
pub fn run_agentic_loop(
    provider: &dyn PlannerProvider,
    telemetry: &Telemetry,
    world: &World,
    goal: Point2,
    safety: &SafetyConfig,
    risk: &RiskConfig,
    max_steps: u32,
    wall_clock_ms: u64,
    max_consecutive_denials: u32,
    model_used: &str,
) -> Result<AgenticOutcome, AgentError> {
    let deadline = Instant::now() + Duration::from_millis(wall_clock_ms);
    let mut memory = AgentMemory::new(crate::memory::DEFAULT_CAPACITY);
    let mut thought_chain = Vec::new();
    let mut last_decision: Option<GovernanceDecision> = None;
    let mut replan_attempts = 0_u32;
    let mut replanning_used = false;

    for step_index in 0 .. max_steps {
        if Instant::now() >= deadline {
            return Err(AgentError::WallClockExceeded { budget_ms: wall_clock_ms });
        }

        let ctx = AgentContext {
            telemetry,
            world,
            goal,
            last_decision: last_decision.as_ref(),
            replan_attempts,
            step_index,
        };
        let tool = provider.next_tool(&ctx);

        match tool {
            AgentTool::AssessEnvironment => {
                step(&mut thought_chain, step_index, assess_narration(telemetry, world));
            }
            AgentTool::CheckPolicy { candidate } => {
                let decision = robogate_policy::evaluate(telemetry, &candidate, world, safety, risk)
                    .unwrap_or_else(|_| GovernanceDecision::fail_closed());
                step(
                    &mut thought_chain,
                    step_index,
                    format!(
                        "checked policy for {:?}: {:?} ({:?})",
                        candidate.intent, decision.decision, decision.policy_state
                    ),
                );
                memory.record(candidate, decision.clone());
                last_decision = Some(decision);
            }
            AgentTool::SubmitAction { candidate } => {
                step(&mut thought_chain, step_index, format!("submitted {:?}", candidate.intent));
                return Ok(AgenticOutcome {
                    proposal: candidate,
                    governance: last_decision,
                    thought_chain,
                    memory_summary: memory.summary(),
                    replanning_used,
                    model_used: model_used.to_string(),
                });
            }
            AgentTool::Replan { hint } => {
                replanning_used = true;
                replan_attempts += 1;
                step(&mut thought_chain, step_index, format!("replanning: {hint}"));
            }
            AgentTool::GracefulStop { reason } => {
                let candidate = ActionProposal::new(Intent::Stop, reason.clone());
                step(&mut thought_chain, step_index, format!("graceful stop: {reason}"));
                return Ok(AgenticOutcome {
                    proposal: candidate,
                    governance: last_decision,
                    thought_chain,
                    memory_summary: memory.summary(),
                    replanning_used,
                    model_used: model_used.to_string(),
                });
            }
        }

        if memory.summary().denial_count >= max_consecutive_denials as usize {
            let candidate = ActionProposal::new(Intent::Stop, "forced graceful stop: consecutive denial limit reached");
            step(&mut thought_chain, step_index, "forced graceful stop: denial_count threshold reached");
            return Ok(AgenticOutcome {
                proposal: candidate,
                governance: last_decision,
                thought_chain,
                memory_summary: memory.summary(),
                replanning_used,
                model_used: model_used.to_string(),
            });
        }
    }

    let candidate = ActionProposal::new(Intent::Wait, "forced graceful stop: max_steps exhausted");
    step(&mut thought_chain, max_steps, "forced graceful stop: max_steps exhausted");
    Ok(AgenticOutcome {
        proposal: candidate,
        governance: last_decision,
        thought_chain,
        memory_summary: memory.summary(),
        replanning_used,
        model_used: model_used.to_string(),
    })
}

fn assess_narration(telemetry: &Telemetry, world: &World) -> String {
    let nearest = world.nearest_obstacle(telemetry.position()).map(|o| o.center().distance_to(telemetry.position()));
    format!(
        "assessed environment: zone={:?} human_detected={} nearest_obstacle_m={:.2} nearest_known_obstacle={:?}",
        telemetry.zone, telemetry.human_detected, telemetry.nearest_obstacle_m, nearest
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use robogate_core::telemetry::Zone;
    use robogate_core::world::Rect;

    use super::*;
    use crate::provider::MockPlannerProvider;

    fn telemetry_at(x: f64, y: f64) -> Telemetry {
        Telemetry {
            x,
            y,
            theta: 0.0,
            speed: 0.0,
            zone: Zone::Other,
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
    fn clean_run_submits_an_approved_move_to() {
        let safety = SafetyConfig::default();
        let risk = RiskConfig::default();
        let provider = MockPlannerProvider::new(safety);
        let outcome = run_agentic_loop(
            &provider,
            &telemetry_at(0.0, 0.0),
            &empty_world(),
            Point2::new(10.0, 0.0),
            &safety,
            &risk,
            6,
            5_000,
            3,
            "mock",
        )
        .expect("loop completes");
        assert!(matches!(outcome.proposal.intent, Intent::MoveTo { .. }));
        assert_eq!(outcome.governance.expect("checked").decision, robogate_core::Decision::Approved);
        assert!(!outcome.thought_chain.is_empty());
    }

    #[test]
    fn forced_stop_after_three_consecutive_denials() {
        let safety = SafetyConfig::default();
        let risk = RiskConfig::default();
        let provider = MockPlannerProvider::new(safety);
        // A human inside the stop radius makes every MOVE_TO candidate
        // denied, so replanning repeats until the forced-stop rule trips.
        let mut telemetry = telemetry_at(0.0, 0.0);
        telemetry.human_detected = true;
        telemetry.human_distance_m = 0.2;
        let outcome = run_agentic_loop(
            &provider,
            &telemetry,
            &empty_world(),
            Point2::new(10.0, 0.0),
            &safety,
            &risk,
            20,
            5_000,
            3,
            "mock",
        )
        .expect("loop completes");
        assert_eq!(outcome.proposal.intent, Intent::Stop);
    }

    #[test]
    fn max_steps_exhaustion_yields_a_wait_proposal() {
        let safety = SafetyConfig::default();
        let risk = RiskConfig::default();
        struct StuckProvider;
        impl PlannerProvider for StuckProvider {
            fn next_tool(&self, _ctx: &AgentContext<'_>) -> AgentTool {
                AgentTool::AssessEnvironment
            }
        }
        let outcome = run_agentic_loop(
            &StuckProvider,
            &telemetry_at(0.0, 0.0),
            &empty_world(),
            Point2::new(10.0, 0.0),
            &safety,
            &risk,
            3,
            5_000,
            3,
            "mock",
        )
        .expect("loop completes");
        assert_eq!(outcome.proposal.intent, Intent::Wait);
    }

    #[test]
    fn wall_clock_budget_of_zero_fails_immediately() {
        let safety = SafetyConfig::default();
        let risk = RiskConfig::default();
        let provider = MockPlannerProvider::new(safety);
        std::thread::sleep(Duration::from_millis(5));
        let result = run_agentic_loop(
            &provider,
            &telemetry_at(0.0, 0.0),
            &empty_world(),
            Point2::new(10.0, 0.0),
            &safety,
            &risk,
            6,
            0,
            3,
            "mock",
        );
        assert!(matches!(result, Err(AgentError::WallClockExceeded { .. })));
    }
}
