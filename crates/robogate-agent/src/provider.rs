// crates/robogate-agent/src/provider.rs
// ============================================================================
// Module: Planner Provider Seam
// Description: The backend-agnostic trait the agentic loop (§4.4.b) drives,
//              plus the deterministic mock used when PLANNER_ENABLED=false.
// Dependencies: robogate-core, robogate-config
// ============================================================================

//! ## Overview
//! [`PlannerProvider`] is the seam an external LLM-backed planner plugs
//! into without the agentic loop itself changing: the loop only knows how
//! to drive the fixed tool set (§4.4.b), never how a step was decided. Per
//! the governance layer's own scope boundary, this crate never talks to an
//! LLM directly — [`MockPlannerProvider`] is the only implementation here,
//! and it is what runs whenever `PLANNER_ENABLED=false` (the tested,
//! deterministic path; §4.4.b "Determinism under mock").

use robogate_config::SafetyConfig;
use robogate_core::GovernanceDecision;
use robogate_core::proposal::ActionProposal;
use robogate_core::proposal::Intent;
use robogate_core::telemetry::Point2;
use robogate_core::telemetry::Telemetry;
use robogate_core::world::World;

use crate::planner;

/// One step of the fixed agentic tool set (§4.4.b).
#[derive(Debug, Clone)]
pub enum AgentTool {
    /// Summarize telemetry/world hazards; does not terminate the loop.
    AssessEnvironment,
    /// Governs `candidate` without appending it anywhere.
    CheckPolicy {
        /// The candidate under consideration.
        candidate: ActionProposal,
    },
    /// Submits `candidate` as the loop's final proposal.
    SubmitAction {
        /// The candidate to submit.
        candidate: ActionProposal,
    },
    /// Records a denial reason in memory; the next step must produce a new
    /// candidate.
    Replan {
        /// Why the previous candidate was rejected.
        hint: String,
    },
    /// Submits a `STOP`/`WAIT` proposal and terminates the loop.
    GracefulStop {
        /// Why the loop is stopping early.
        reason: String,
    },
}

/// The context a provider sees when deciding the next tool call.
#[derive(Debug, Clone)]
pub struct AgentContext<'a> {
    /// Current telemetry.
    pub telemetry: &'a Telemetry,
    /// Current world snapshot.
    pub world: &'a World,
    /// The mission goal.
    pub goal: Point2,
    /// The decision from the most recently checked or submitted candidate,
    /// if any.
    pub last_decision: Option<&'a GovernanceDecision>,
    /// How many `Replan` tools have been issued so far this call.
    pub replan_attempts: u32,
    /// How many tool invocations have been issued so far this call.
    pub step_index: u32,
}

/// Backend-agnostic planner seam driving the agentic loop's tool calls.
///
/// Implementations must be deterministic for a fixed `ctx` when
/// `PLANNER_ENABLED=false` is in effect; an LLM-backed implementation may
/// relax this, but the loop itself never assumes determinism beyond what
/// the provider promises.
pub trait PlannerProvider: Send + Sync {
    /// Returns the next tool to invoke given the current context.
    fn next_tool(&self, ctx: &AgentContext<'_>) -> AgentTool;
}

/// The deterministic provider used whenever no LLM planner is configured.
///
/// Drives exactly the rule-based sequence the deterministic planner (§4.4.a)
/// would: assess once, propose a candidate, check it, submit if approved,
/// otherwise replan up to `safety.max_replans` times before giving up.
#[derive(Debug, Clone)]
pub struct MockPlannerProvider {
    safety: SafetyConfig,
}

impl MockPlannerProvider {
    /// Builds a mock provider bound to the given safety thresholds.
    #[must_use]
    pub const fn new(safety: SafetyConfig) -> Self {
        Self { safety }
    }
}

impl PlannerProvider for MockPlannerProvider {
    fn next_tool(&self, ctx: &AgentContext<'_>) -> AgentTool {
        if ctx.step_index == 0 {
            return AgentTool::AssessEnvironment;
        }

        let candidate =
            planner::plan_tick(ctx.telemetry, ctx.world, ctx.goal, ctx.last_decision, &self.safety, ctx.replan_attempts);

        let Some(decision) = ctx.last_decision else {
            return AgentTool::CheckPolicy { candidate };
        };

        if matches!(candidate.intent, Intent::Stop | Intent::Wait) {
            return AgentTool::SubmitAction { candidate };
        }

        if decision.decision == robogate_core::Decision::Approved {
            return AgentTool::SubmitAction { candidate };
        }

        if ctx.replan_attempts >= self.safety.max_replans {
            return AgentTool::GracefulStop { reason: "replan attempts exhausted".to_string() };
        }

        if decision.policy_state == robogate_core::PolicyState::Stop {
            return AgentTool::GracefulStop { reason: "policy halted the proposal".to_string() };
        }

        AgentTool::Replan { hint: decision.required_action.clone().unwrap_or_else(|| "replan requested".to_string()) }
    }
}
