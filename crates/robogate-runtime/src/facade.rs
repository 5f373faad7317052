// crates/robogate-runtime/src/facade.rs
// ============================================================================
// Module: Decision API Facade
// Description: Synchronous, stateless endpoints composing C2/C3/C4/C5
//              without depending on a running control loop (C8, spec §4.8).
// Purpose: Back `/policies/test`, `/plan/generate`, `/plan/execute`, and
//          `/agent/propose` with the same collaborators the control loop
//          uses, so the server crate never re-implements governance logic.
// Dependencies: robogate-agent, robogate-policy, robogate-core, robogate-config
// ============================================================================

//! ## Overview
//! [`DecisionFacade`] holds the same `SimulatorClient`/`EventLogStore`
//! collaborators [`crate::control_loop::run_control_loop`] does, but calls
//! them directly rather than owning a ticking task. Only [`Self::plan_execute`]
//! writes to the event log; the other three methods are read-only.

use std::sync::Arc;

use robogate_agent::agentic::AgenticOutcome;
use robogate_agent::agentic::run_agentic_loop;
use robogate_agent::planner;
use robogate_agent::provider::MockPlannerProvider;
use robogate_config::RuntimeConfig;
use robogate_core::Decision;
use robogate_core::GovernanceDecision;
use robogate_core::HashDigest;
use robogate_core::PolicyState;
use robogate_core::RunId;
use robogate_core::event::CommandResult;
use robogate_core::event::ExecutedCommand;
use robogate_core::event::EventPayload;
use robogate_core::event::PlanStep;
use robogate_core::interfaces::EventLogStore;
use robogate_core::interfaces::SimulatorClient;
use robogate_core::proposal::ActionProposal;
use robogate_core::proposal::Intent;
use robogate_core::telemetry::Point2;
use robogate_core::telemetry::Telemetry;
use serde::Deserialize;
use serde::Serialize;

use crate::ids::IdGenerator;

/// One waypoint of a generated or executed plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanWaypoint {
    /// Target x, meters.
    pub x: f64,
    /// Target y, meters.
    pub y: f64,
    /// Speed cap for this waypoint's motion, m/s.
    pub max_speed: f64,
}

/// The result of [`DecisionFacade::plan_generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGenerateOutcome {
    /// The generated waypoint sequence.
    pub waypoints: Vec<PlanWaypoint>,
    /// Human-readable justification for the plan.
    pub rationale: String,
    /// The governance decision for each waypoint, same length as `waypoints`.
    pub governance: Vec<GovernanceDecision>,
    /// Whether every waypoint's governance decision was `APPROVED`.
    pub all_approved: bool,
    /// Rough travel-time estimate for the whole plan, seconds.
    pub estimated_time_s: f64,
}

/// One waypoint's outcome within [`PlanExecuteOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStepOutcome {
    /// Index of this waypoint within the plan.
    pub waypoint_index: usize,
    /// Whether this waypoint's command was actually sent to the simulator.
    pub executed: bool,
    /// The governance decision for this waypoint.
    pub governance_decision: GovernanceDecision,
}

/// Overall status of a [`DecisionFacade::plan_execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanExecutionStatus {
    /// Every waypoint was governed `APPROVED` and executed.
    Completed,
    /// At least one waypoint executed, but at least one was blocked.
    CompletedWithWarnings,
    /// No waypoint was approved; nothing was sent to the simulator.
    Blocked,
}

/// The result of [`DecisionFacade::plan_execute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExecuteOutcome {
    /// Overall outcome across every waypoint.
    pub status: PlanExecutionStatus,
    /// Per-waypoint execution detail, in waypoint order.
    pub steps: Vec<PlanStepOutcome>,
    /// Hash of the last event appended during this call, for audit lookup.
    pub audit_hash: Option<HashDigest>,
}

/// Stateless facade composing the sim adapter, policy engine, agent planner,
/// and event log for the four synchronous Decision API endpoints.
pub struct DecisionFacade {
    sim: Arc<dyn SimulatorClient>,
    store: Arc<dyn EventLogStore>,
    config: Arc<RuntimeConfig>,
    synthetic_run_ids: IdGenerator,
}

impl DecisionFacade {
    /// Builds a facade over the given collaborators.
    #[must_use]
    pub fn new(sim: Arc<dyn SimulatorClient>, store: Arc<dyn EventLogStore>, config: Arc<RuntimeConfig>) -> Self {
        Self { sim, store, config, synthetic_run_ids: IdGenerator::new("plan-exec") }
    }

    /// `policy.test`: governs `proposal` against `telemetry` and the
    /// current world snapshot, with no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`](robogate_core::RobogateError)
    /// if the world snapshot cannot be fetched.
    pub async fn policy_test(
        &self,
        telemetry: &Telemetry,
        proposal: &ActionProposal,
    ) -> Result<GovernanceDecision, robogate_core::RobogateError> {
        let world = self.sim.get_world().await?;
        Ok(
            robogate_policy::evaluate(telemetry, proposal, &world, &self.config.safety, &self.config.risk)
                .unwrap_or_else(|_| GovernanceDecision::fail_closed()),
        )
    }

    /// `plan.generate`: produces a waypoint sequence toward `goal` from the
    /// simulator's current telemetry, governing each waypoint against a
    /// telemetry snapshot projected to the previous waypoint. Has no side
    /// effects: nothing is sent to the simulator or appended to the log.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`](robogate_core::RobogateError)
    /// if telemetry or world cannot be fetched.
    pub async fn plan_generate(
        &self,
        instruction: &str,
        goal: Point2,
    ) -> Result<PlanGenerateOutcome, robogate_core::RobogateError> {
        let mut telemetry = self.sim.get_telemetry().await?;
        let world = self.sim.get_world().await?;
        let origin = telemetry.position();

        let mut waypoints = Vec::new();
        let mut governance_per_waypoint = Vec::new();
        let mut last_governance: Option<GovernanceDecision> = None;
        let mut replan_attempt = 0_u32;

        for _ in 0 ..= self.config.safety.max_replans {
            let proposal =
                planner::plan_tick(&telemetry, &world, goal, last_governance.as_ref(), &self.config.safety, replan_attempt);
            let Some((x, y)) = proposal.intent.target() else {
                break;
            };
            let governance = robogate_policy::evaluate(&telemetry, &proposal, &world, &self.config.safety, &self.config.risk)
                .unwrap_or_else(|_| GovernanceDecision::fail_closed());
            let waypoint =
                PlanWaypoint { x, y, max_speed: proposal.intent.max_speed().unwrap_or(self.config.safety.default_speed) };
            let replanning = governance.policy_state == PolicyState::Replan;

            waypoints.push(waypoint);
            governance_per_waypoint.push(governance.clone());

            if !replanning {
                break;
            }
            replan_attempt += 1;
            telemetry = project_telemetry(&telemetry, waypoint);
            last_governance = Some(governance);
        }

        let all_approved = governance_per_waypoint.iter().all(|g| g.decision == Decision::Approved);
        let estimated_time_s = estimate_travel_time_s(origin, &waypoints, self.config.safety.default_speed);

        Ok(PlanGenerateOutcome {
            waypoints,
            rationale: format!("generated from instruction: {instruction}"),
            governance: governance_per_waypoint,
            all_approved,
            estimated_time_s,
        })
    }

    /// `plan.execute`: governs and, where approved, executes each waypoint
    /// in order, appending `DECISION`/`EXECUTION` events under `run_id` (or
    /// a freshly synthesized one), then a summary `PLAN` event.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::Fatal`](robogate_core::RobogateError) if the
    /// event log itself cannot be written to.
    pub async fn plan_execute(
        &self,
        run_id: Option<RunId>,
        waypoints: &[PlanWaypoint],
        rationale: &str,
    ) -> Result<PlanExecuteOutcome, robogate_core::RobogateError> {
        let run_id = run_id.unwrap_or_else(|| RunId::new(self.synthetic_run_ids.issue()));
        let mut telemetry = self.sim.get_telemetry().await?;
        let world = self.sim.get_world().await?;

        let mut steps = Vec::with_capacity(waypoints.len());
        let mut plan_steps = Vec::with_capacity(waypoints.len());
        let mut last_event = None;

        for (waypoint_index, waypoint) in waypoints.iter().enumerate() {
            let proposal = ActionProposal::new(
                Intent::MoveTo { x: waypoint.x, y: waypoint.y, max_speed: waypoint.max_speed },
                rationale.to_string(),
            );
            let governance = robogate_policy::evaluate(&telemetry, &proposal, &world, &self.config.safety, &self.config.risk)
                .unwrap_or_else(|_| GovernanceDecision::fail_closed());

            let decision_payload = EventPayload::Decision {
                context: robogate_core::event::DecisionContext { telemetry: telemetry.clone(), mission_goal: origin_goal(waypoint) },
                proposal: proposal.clone(),
                governance: governance.clone(),
            };
            let decision_event = self.store.append(&run_id, decision_payload).await?;
            last_event = Some(decision_event);

            let executed = governance.decision == Decision::Approved;
            if executed {
                let outcome = self.sim.send_command(&proposal).await?;
                let execution_payload = EventPayload::Execution {
                    command: executed_command(&proposal.intent),
                    result: CommandResult { accepted: outcome.accepted, reason: outcome.reason.clone() },
                };
                last_event = Some(self.store.append(&run_id, execution_payload).await?);
                telemetry = project_telemetry(&telemetry, *waypoint);
            }

            plan_steps.push(PlanStep { waypoint_index, executed, governance_decision: governance.clone() });
            steps.push(PlanStepOutcome { waypoint_index, executed, governance_decision: governance });
        }

        let summary_event = self.store.append(&run_id, EventPayload::Plan { steps: plan_steps }).await?;
        let audit_hash = Some(summary_event.hash);
        let _ = last_event;

        let executed_count = steps.iter().filter(|step| step.executed).count();
        let status = if steps.is_empty() || executed_count == steps.len() {
            if steps.is_empty() { PlanExecutionStatus::Blocked } else { PlanExecutionStatus::Completed }
        } else if executed_count == 0 {
            PlanExecutionStatus::Blocked
        } else {
            PlanExecutionStatus::CompletedWithWarnings
        };

        Ok(PlanExecuteOutcome { status, steps, audit_hash })
    }

    /// `agentic.propose`: runs the bounded agentic tool-calling loop from
    /// the simulator's current telemetry toward `goal`, with no side
    /// effects beyond the returned outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::TransientExternal`](robogate_core::RobogateError)
    /// if telemetry/world cannot be fetched or the agentic loop exceeds its
    /// wall-clock budget.
    pub async fn agentic_propose(&self, goal: Point2) -> Result<AgenticOutcome, robogate_core::RobogateError> {
        let telemetry = self.sim.get_telemetry().await?;
        let world = self.sim.get_world().await?;
        let provider = MockPlannerProvider::new(self.config.safety);
        run_agentic_loop(
            &provider,
            &telemetry,
            &world,
            goal,
            &self.config.safety,
            &self.config.risk,
            self.config.agent.max_steps,
            self.config.agent.wall_clock_ms,
            self.config.agent.max_consecutive_denials,
            "mock",
        )
        .map_err(|err| robogate_core::RobogateError::TransientExternal(err.to_string()))
    }
}

/// Returns a best-effort "goal" for a single waypoint's decision context:
/// `plan.execute` governs one waypoint at a time, so the waypoint itself
/// stands in for the mission goal that single governance call is judged
/// against.
fn origin_goal(waypoint: &PlanWaypoint) -> Point2 {
    Point2::new(waypoint.x, waypoint.y)
}

/// Builds a telemetry snapshot identical to `telemetry` except at
/// `waypoint`'s position, for governing the next waypoint in sequence.
fn project_telemetry(telemetry: &Telemetry, waypoint: PlanWaypoint) -> Telemetry {
    Telemetry { x: waypoint.x, y: waypoint.y, ..telemetry.clone() }
}

/// Renders a proposal's intent as the `{intent, params}` shape an
/// `EXECUTION` event records.
fn executed_command(intent: &Intent) -> ExecutedCommand {
    let wire = serde_json::to_value(intent).unwrap_or(serde_json::Value::Null);
    let tag = wire.get("intent").and_then(serde_json::Value::as_str).unwrap_or("UNKNOWN").to_string();
    let params = wire.get("params").cloned().unwrap_or(serde_json::Value::Null);
    ExecutedCommand { intent: tag, params }
}

/// Rough travel-time estimate: sums each leg's distance over its speed cap.
fn estimate_travel_time_s(origin: Point2, waypoints: &[PlanWaypoint], fallback_speed: f64) -> f64 {
    let mut previous = origin;
    let mut total = 0.0;
    for waypoint in waypoints {
        let target = Point2::new(waypoint.x, waypoint.y);
        let speed = if waypoint.max_speed > f64::EPSILON { waypoint.max_speed } else { fallback_speed };
        total += previous.distance_to(target) / speed;
        previous = target;
    }
    total
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use robogate_core::InMemoryEventLogStore;
    use robogate_core::telemetry::Zone;
    use robogate_core::world::Obstacle;
    use robogate_core::world::Rect;
    use robogate_sim::MockSimulatorClient;

    use super::*;

    fn telemetry_at(x: f64, y: f64) -> Telemetry {
        Telemetry {
            x,
            y,
            theta: 0.0,
            speed: 0.0,
            zone: Zone::Aisle,
            nearest_obstacle_m: 10.0,
            human_detected: false,
            human_conf: 0.0,
            human_distance_m: 10.0,
            battery: None,
            target: None,
            events: Vec::new(),
        }
    }

    fn empty_world() -> robogate_core::world::World {
        robogate_core::world::World {
            geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 },
            zones: Vec::new(),
            obstacles: Vec::new(),
            human: None,
            bays: Vec::new(),
        }
    }

    fn facade(world: robogate_core::world::World, telemetry: Telemetry) -> DecisionFacade {
        let sim: Arc<dyn SimulatorClient> = Arc::new(MockSimulatorClient::new(vec![telemetry], world));
        let store: Arc<dyn EventLogStore> = Arc::new(InMemoryEventLogStore::new());
        DecisionFacade::new(sim, store, Arc::new(RuntimeConfig::default()))
    }

    #[tokio::test]
    async fn policy_test_denies_a_proposal_outside_the_geofence() {
        let world = robogate_core::world::World {
            geofence: Rect { min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 },
            ..empty_world()
        };
        let facade = facade(world, telemetry_at(0.0, 0.0));
        let proposal = ActionProposal::new(Intent::MoveTo { x: -1.0, y: 5.0, max_speed: 0.3 }, "test");
        let decision = facade.policy_test(&telemetry_at(0.0, 0.0), &proposal).await.expect("policy_test");
        assert_eq!(decision.decision, Decision::Denied);
    }

    #[tokio::test]
    async fn plan_generate_inserts_a_detour_waypoint_around_a_blocking_obstacle() {
        let world = robogate_core::world::World { obstacles: vec![Obstacle { x: 5.0, y: 5.0, r: 0.6 }], ..empty_world() };
        let facade = facade(world, telemetry_at(0.0, 5.0));
        let outcome = facade.plan_generate("go to the loading bay", Point2::new(10.0, 5.0)).await.expect("plan_generate");
        assert!(outcome.waypoints.len() >= 2);
        assert!(!outcome.all_approved || outcome.governance.iter().any(|g| g.policy_state == PolicyState::Replan));
    }

    #[tokio::test]
    async fn plan_execute_reports_blocked_when_every_waypoint_is_denied() {
        let mut close_human = telemetry_at(0.0, 0.0);
        close_human.human_detected = true;
        close_human.human_distance_m = 0.5;
        let facade = facade(empty_world(), close_human);
        let waypoints = vec![PlanWaypoint { x: 5.0, y: 0.0, max_speed: 0.5 }];
        let outcome = facade.plan_execute(None, &waypoints, "proceed").await.expect("plan_execute");
        assert_eq!(outcome.status, PlanExecutionStatus::Blocked);
        assert!(outcome.audit_hash.is_some());
    }

    #[tokio::test]
    async fn plan_execute_reports_completed_when_every_waypoint_is_approved() {
        let facade = facade(empty_world(), telemetry_at(0.0, 0.0));
        let waypoints = vec![PlanWaypoint { x: 1.0, y: 0.0, max_speed: 0.3 }];
        let outcome = facade.plan_execute(None, &waypoints, "proceed").await.expect("plan_execute");
        assert_eq!(outcome.status, PlanExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn agentic_propose_returns_an_approved_move_to_in_a_clear_world() {
        let facade = facade(empty_world(), telemetry_at(0.0, 0.0));
        let outcome = facade.agentic_propose(Point2::new(5.0, 0.0)).await.expect("agentic_propose");
        assert!(matches!(outcome.proposal.intent, Intent::MoveTo { .. }));
    }
}
