// crates/robogate-runtime/src/control_loop.rs
// ============================================================================
// Module: Control Loop
// Description: The per-run cooperative tick loop: propose, govern, execute,
//              append, broadcast (C7, spec §4.7).
// Purpose: Drive one run from `start_run` to a terminal status, composing
//          the sim adapter, policy engine, agent planner, event log, and
//          broadcast hub behind their trait seams so it is testable without
//          a network or a filesystem.
// Dependencies: robogate-agent, robogate-policy, robogate-core, tokio, tracing
// ============================================================================

//! ## Overview
//! [`run_control_loop`] owns nothing but its parameters: it references the
//! sim adapter, event log, and hub only through the [`SimulatorClient`],
//! [`EventLogStore`], and [`Hub`] trait objects handed to it, and observes
//! termination only through `stop_flag` (§9 "cyclic references... break
//! with indirection by run_id"). The [`crate::registry::RunRegistry`] is
//! responsible for wiring those collaborators and for committing the
//! resulting [`LoopOutcome`] to the run's row.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use robogate_agent::planner;
use robogate_config::RuntimeConfig;
use robogate_core::Decision;
use robogate_core::GovernanceDecision;
use robogate_core::HubMessage;
use robogate_core::Intent;
use robogate_core::PolicyState;
use robogate_core::RunId;
use robogate_core::RunStatus;
use robogate_core::event::CommandResult;
use robogate_core::event::DecisionContext;
use robogate_core::event::ExecutedCommand;
use robogate_core::event::EventPayload;
use robogate_core::interfaces::EventLogStore;
use robogate_core::interfaces::Hub;
use robogate_core::interfaces::SimulatorClient;
use robogate_core::telemetry::Point2;
use robogate_core::world::World;

use crate::stagnation::StagnationDetector;

/// How long a cached world snapshot remains valid before a fresh fetch is
/// attempted (§4.7 "cached with 1 s TTL").
const WORLD_CACHE_TTL: Duration = Duration::from_secs(1);

/// Why a run's control loop stopped ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// `stop_run` was requested and observed at a suspension point.
    Stopped,
    /// The agent proposed `STOP` and the policy engine approved it.
    Completed,
    /// The loop hit an unrecoverable fault (§7 `Fatal`).
    Failed,
}

/// Runs one mission's control loop until it terminates.
///
/// # Panics
///
/// Never panics itself: a panic inside one tick's decision computation
/// (the planner/policy call) is caught, appended as an `ALERT`, and
/// terminates the loop with [`LoopOutcome::Failed`] rather than unwinding
/// into the caller (§7 `Fatal`, the loop supervisor's only
/// `catch_unwind` boundary).
#[allow(clippy::too_many_arguments, reason = "mirrors the tick context every collaborator must supply")]
pub async fn run_control_loop(
    run_id: RunId,
    goal: Point2,
    sim: Arc<dyn SimulatorClient>,
    store: Arc<dyn EventLogStore>,
    hub: Arc<dyn Hub>,
    config: Arc<RuntimeConfig>,
    stop_flag: Arc<AtomicBool>,
) -> LoopOutcome {
    let tick_period = Duration::from_millis(config.tick_period_ms);
    let mut world_cache: Option<(World, Instant)> = None;
    let mut last_governance: Option<GovernanceDecision> = None;
    let mut replan_attempt = 0_u32;
    let mut stagnation = StagnationDetector::new(config.stagnation);

    loop {
        if stop_flag.load(Ordering::Acquire) {
            hub.publish(&run_id, HubMessage::Status(RunStatus::Stopped));
            return LoopOutcome::Stopped;
        }

        let telemetry = match sim.get_telemetry().await {
            Ok(telemetry) => telemetry,
            Err(err) => {
                tracing::warn!(run_id = %run_id, error = %err, "telemetry fetch failed, skipping tick");
                append_and_broadcast_alert(&*store, &*hub, &run_id, "sim_telemetry_failed", &err.to_string()).await;
                tokio::time::sleep(tick_period).await;
                continue;
            }
        };

        let world = match fetch_world(&*sim, &mut world_cache).await {
            Ok(world) => world,
            Err(err) => {
                tracing::warn!(run_id = %run_id, error = %err, "world fetch failed, skipping tick");
                append_and_broadcast_alert(&*store, &*hub, &run_id, "sim_world_failed", &err.to_string()).await;
                tokio::time::sleep(tick_period).await;
                continue;
            }
        };

        hub.publish(&run_id, HubMessage::Telemetry(telemetry.clone()));
        for tag in &telemetry.events {
            hub.publish(
                &run_id,
                HubMessage::Alert { kind: "telemetry_event".to_string(), message: tag.clone(), details: None },
            );
        }

        let computed = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let proposal = planner::plan_tick(&telemetry, &world, goal, last_governance.as_ref(), &config.safety, replan_attempt);
            let governance = robogate_policy::evaluate(&telemetry, &proposal, &world, &config.safety, &config.risk)
                .unwrap_or_else(|_| GovernanceDecision::fail_closed());
            (proposal, governance)
        }));
        let (proposal, governance) = match computed {
            Ok(pair) => pair,
            Err(_panic) => {
                tracing::error!(run_id = %run_id, "tick decision computation panicked");
                append_and_broadcast_alert(&*store, &*hub, &run_id, "loop_error", "tick decision computation panicked").await;
                hub.publish(&run_id, HubMessage::Status(RunStatus::Failed));
                return LoopOutcome::Failed;
            }
        };

        replan_attempt = if governance.policy_state == PolicyState::Replan { replan_attempt + 1 } else { 0 };

        let decision_payload = EventPayload::Decision {
            context: DecisionContext { telemetry: telemetry.clone(), mission_goal: goal },
            proposal: proposal.clone(),
            governance: governance.clone(),
        };
        let decision_event = match store.append(&run_id, decision_payload).await {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(run_id = %run_id, error = %err, "failed to append DECISION event");
                hub.publish(
                    &run_id,
                    HubMessage::Alert {
                        kind: "loop_error".to_string(),
                        message: format!("failed to append DECISION event: {err}"),
                        details: None,
                    },
                );
                hub.publish(&run_id, HubMessage::Status(RunStatus::Failed));
                return LoopOutcome::Failed;
            }
        };
        hub.publish(&run_id, HubMessage::Event(decision_event));

        if governance.decision == Decision::Approved {
            match sim.send_command(&proposal).await {
                Ok(outcome) => {
                    let execution_payload = EventPayload::Execution {
                        command: executed_command(&proposal.intent),
                        result: CommandResult { accepted: outcome.accepted, reason: outcome.reason.clone() },
                    };
                    match store.append(&run_id, execution_payload).await {
                        Ok(event) => hub.publish(&run_id, HubMessage::Event(event)),
                        Err(err) => {
                            tracing::error!(run_id = %run_id, error = %err, "failed to append EXECUTION event");
                            hub.publish(
                                &run_id,
                                HubMessage::Alert {
                                    kind: "loop_error".to_string(),
                                    message: format!("failed to append EXECUTION event: {err}"),
                                    details: None,
                                },
                            );
                            hub.publish(&run_id, HubMessage::Status(RunStatus::Failed));
                            return LoopOutcome::Failed;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(run_id = %run_id, error = %err, "simulator rejected or failed to accept command");
                    append_and_broadcast_alert(&*store, &*hub, &run_id, "sim_command_failed", &err.to_string()).await;
                }
            }
        }

        let goal_distance = telemetry.position().distance_to(goal);
        let stagnation_outcome = stagnation.observe(goal_distance);
        if stagnation_outcome.tripped {
            let payload = EventPayload::Stagnation { stagnant_cycles: stagnation_outcome.stagnant_cycles, goal_distance };
            if let Ok(event) = store.append(&run_id, payload).await {
                hub.publish(&run_id, HubMessage::Event(event));
            }
            hub.publish(
                &run_id,
                HubMessage::Alert {
                    kind: "stagnation".to_string(),
                    message: format!("no progress for {} consecutive ticks", stagnation_outcome.stagnant_cycles),
                    details: None,
                },
            );
        }

        last_governance = Some(governance.clone());

        if proposal.intent == Intent::Stop && governance.decision == Decision::Approved {
            hub.publish(&run_id, HubMessage::Status(RunStatus::Completed));
            return LoopOutcome::Completed;
        }

        tokio::time::sleep(tick_period).await;
    }
}

/// Appends an `ALERT` event and broadcasts it, best-effort: if the append
/// itself fails, the alert is still broadcast so operators are not left
/// silent, but the tick proceeds rather than failing the whole run (these
/// are recoverable per §7, unlike a DECISION/EXECUTION append failure).
async fn append_and_broadcast_alert(store: &dyn EventLogStore, hub: &dyn Hub, run_id: &RunId, kind: &str, message: &str) {
    let payload = EventPayload::Alert { kind: kind.to_string(), message: message.to_string(), details: None };
    match store.append(run_id, payload).await {
        Ok(event) => hub.publish(run_id, HubMessage::Event(event)),
        Err(_err) => hub.publish(
            run_id,
            HubMessage::Alert { kind: kind.to_string(), message: message.to_string(), details: None },
        ),
    }
}

/// Refreshes the cached world snapshot if it has expired, falling back to
/// the stale cached value if the refresh call fails (§4.7 "cached with 1 s
/// TTL"); only errors with no cached value at all propagate.
async fn fetch_world(
    sim: &dyn SimulatorClient,
    cache: &mut Option<(World, Instant)>,
) -> Result<World, robogate_core::RobogateError> {
    if let Some((world, fetched_at)) = cache {
        if fetched_at.elapsed() < WORLD_CACHE_TTL {
            return Ok(world.clone());
        }
    }
    match sim.get_world().await {
        Ok(world) => {
            *cache = Some((world.clone(), Instant::now()));
            Ok(world)
        }
        Err(err) => match cache {
            Some((world, _)) => Ok(world.clone()),
            None => Err(err),
        },
    }
}

/// Renders a proposal's intent as the `{intent, params}` shape an
/// `EXECUTION` event records, reusing `Intent`'s own tagged-union wire form.
fn executed_command(intent: &Intent) -> ExecutedCommand {
    let wire = serde_json::to_value(intent).unwrap_or(serde_json::Value::Null);
    let tag = wire.get("intent").and_then(serde_json::Value::as_str).unwrap_or("UNKNOWN").to_string();
    let params = wire.get("params").cloned().unwrap_or(serde_json::Value::Null);
    ExecutedCommand { intent: tag, params }
}
