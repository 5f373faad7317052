// crates/robogate-server/src/handlers.rs
// ============================================================================
// Module: HTTP Handlers
// Description: Request/response types and handler functions for every
//              JSON endpoint in §6's route table (all but the WebSocket
//              stream, which lives in ws.rs).
// Purpose: Thin translation between axum extractors and the collaborators
//          held in AppState; no governance or storage logic lives here.
// Dependencies: axum, robogate-core, robogate-runtime, serde
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use robogate_core::ActionProposal;
use robogate_core::MissionId;
use robogate_core::PolicyId;
use robogate_core::Point2;
use robogate_core::RunId;
use robogate_core::Telemetry;
use robogate_core::event::Event;
use robogate_core::run::Run;
use robogate_runtime::facade::PlanExecuteOutcome;
use robogate_runtime::facade::PlanGenerateOutcome;
use robogate_runtime::facade::PlanWaypoint;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::ApiError;
use crate::missions::CreateMissionRequest;
use crate::missions::MissionRecord;
use crate::missions::UpdateMissionRequest;
use crate::state::AppState;

/// Response of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `true`: a response at all means the process is up.
    pub ok: bool,
    /// Whether the LLM-backed planner provider is enabled for this process.
    pub planner_enabled: bool,
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { ok: true, planner_enabled: state.config.agent.planner_enabled })
}

/// `POST /missions`.
pub async fn create_mission(
    State(state): State<AppState>,
    Json(request): Json<CreateMissionRequest>,
) -> Json<MissionRecord> {
    Json(state.missions.create(request))
}

/// `GET /missions`.
pub async fn list_missions(State(state): State<AppState>) -> Json<Vec<MissionRecord>> {
    Json(state.missions.list())
}

/// `GET /missions/{id}`.
///
/// # Errors
///
/// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
pub async fn get_mission(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<MissionRecord>, ApiError> {
    Ok(Json(state.missions.get(&MissionId::new(id))?))
}

/// `PATCH /missions/{id}`.
///
/// # Errors
///
/// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
pub async fn update_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMissionRequest>,
) -> Result<Json<MissionRecord>, ApiError> {
    Ok(Json(state.missions.update(&MissionId::new(id), request)?))
}

/// `DELETE /missions/{id}`.
///
/// # Errors
///
/// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
pub async fn delete_mission(State(state): State<AppState>, Path(id): Path<String>) -> Result<(), ApiError> {
    state.missions.delete(&MissionId::new(id))
}

/// Response of `POST /missions/{id}/start|pause|resume`.
#[derive(Debug, Serialize)]
pub struct RunRefResponse {
    /// The run this lifecycle operation affects.
    pub run_id: RunId,
}

/// `POST /missions/{id}/start`: spawns a fresh control-loop run toward the
/// mission's goal.
///
/// # Errors
///
/// Returns [`ApiError::MissionNotFound`] if `id` is unknown, or
/// [`ApiError::RunService`] if a run with the synthesized id is already
/// active (practically unreachable: run ids are freshly generated here).
pub async fn start_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunRefResponse>, ApiError> {
    let mission_id = MissionId::new(id);
    let record = state.missions.get(&mission_id)?;
    let run_id = RunId::new(format!("run-{}", record.mission.id));
    state.spawn_run(mission_id.clone(), run_id.clone(), record.mission.goal)?;
    state.missions.set_active_run(&mission_id, run_id.clone());
    Ok(Json(RunRefResponse { run_id }))
}

/// `POST /missions/{id}/pause`: stops the mission's active run. The run
/// itself keeps its event log; `resume` starts a new run continuing toward
/// the same goal.
///
/// # Errors
///
/// Returns [`ApiError::MissionNotFound`] if `id` is unknown, or
/// [`ApiError::BadRequest`] if the mission has no active run.
pub async fn pause_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunRefResponse>, ApiError> {
    let mission_id = MissionId::new(id);
    let record = state.missions.get(&mission_id)?;
    let run_id = record.active_run_id.ok_or_else(|| ApiError::BadRequest("mission has no active run".to_string()))?;
    state.registry.stop_run(&run_id)?;
    Ok(Json(RunRefResponse { run_id }))
}

/// `POST /missions/{id}/resume`: starts a fresh run toward the mission's
/// goal, superseding whatever run was last active.
///
/// # Errors
///
/// Returns [`ApiError::MissionNotFound`] if `id` is unknown.
pub async fn resume_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunRefResponse>, ApiError> {
    start_mission(State(state), Path(id)).await
}

/// `GET /runs/{id}`.
///
/// # Errors
///
/// Returns [`ApiError::RunService`] if `id` is unknown to the registry.
pub async fn get_run(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Run>, ApiError> {
    Ok(Json(state.registry.get(&RunId::new(id))?))
}

/// Query parameters for `GET /runs/{id}/events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only return events with `seq` greater than this value.
    pub since_seq: Option<u64>,
}

/// `GET /runs/{id}/events`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if the event log cannot be read.
pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state.store.list(&RunId::new(id), query.since_seq).await?;
    Ok(Json(events))
}

/// `POST /runs/{id}/stop`.
///
/// # Errors
///
/// Returns [`ApiError::RunService`] if `id` is unknown to the registry.
pub async fn stop_run(State(state): State<AppState>, Path(id): Path<String>) -> Result<(), ApiError> {
    state.registry.stop_run(&RunId::new(id))?;
    Ok(())
}

/// `GET /runs/{id}/path_preview`: regenerates a plan preview toward the
/// owning mission's goal from the simulator's current telemetry. There is
/// no separate per-tick plan cache in this process (the control loop
/// recomputes a waypoint every tick rather than storing one), so this
/// substitutes an on-demand [`robogate_runtime::facade::DecisionFacade::plan_generate`]
/// call for a cache read.
///
/// # Errors
///
/// Returns [`ApiError::RunService`] if `id` is unknown, or
/// [`ApiError::Collaborator`] if the simulator cannot be reached.
pub async fn path_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlanGenerateOutcome>, ApiError> {
    let run_id = RunId::new(id);
    let run = state.registry.get(&run_id)?;
    let mission = state.missions.get(&run.mission_id)?;
    let outcome = state.facade.plan_generate("path preview", mission.mission.goal).await?;
    Ok(Json(outcome))
}

/// `GET /sim/world`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if the simulator cannot be reached.
pub async fn get_world(State(state): State<AppState>) -> Result<Json<robogate_core::world::World>, ApiError> {
    Ok(Json(state.sim.get_world().await?))
}

/// Body of `POST /sim/scenario`.
#[derive(Debug, Deserialize)]
pub struct ScenarioRequest {
    /// Name of the scripted scenario to switch the simulator to.
    pub scenario: String,
}

/// `POST /sim/scenario`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if the simulator rejects the scenario name.
pub async fn trigger_scenario(
    State(state): State<AppState>,
    Json(request): Json<ScenarioRequest>,
) -> Result<(), ApiError> {
    state.sim.trigger_scenario(&request.scenario).await?;
    Ok(())
}

/// One entry of `GET /policies`'s static catalog listing.
#[derive(Debug, Serialize)]
pub struct PolicyInfo {
    /// The policy's identifier.
    pub id: PolicyId,
    /// A short human-readable description.
    pub description: String,
}

/// `GET /policies`: a fixed listing, since the policy engine itself is a
/// pure function with no catalog-introspection API of its own.
pub async fn list_policies() -> Json<Vec<PolicyInfo>> {
    Json(vec![
        PolicyInfo { id: PolicyId::Geofence01, description: "target lies outside the operational geofence".to_string() },
        PolicyInfo { id: PolicyId::HumanProx01, description: "human within the hard stop radius".to_string() },
        PolicyInfo { id: PolicyId::HumanProx02, description: "human within the slow-down radius".to_string() },
        PolicyInfo { id: PolicyId::SpeedLimit01, description: "proposed speed exceeds the zone's limit".to_string() },
        PolicyInfo { id: PolicyId::Collision01, description: "nearest obstacle within the collision radius".to_string() },
        PolicyInfo { id: PolicyId::PathBlocked01, description: "a known obstacle blocks the straight path".to_string() },
        PolicyInfo { id: PolicyId::Battery01, description: "battery below the low-battery advisory threshold".to_string() },
    ])
}

/// Body of `POST /policies/test`.
#[derive(Debug, Deserialize)]
pub struct PolicyTestRequest {
    /// Telemetry snapshot to govern against.
    pub telemetry: Telemetry,
    /// The candidate proposal.
    pub proposal: ActionProposal,
}

/// `POST /policies/test`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if the world snapshot cannot be fetched.
pub async fn policy_test(
    State(state): State<AppState>,
    Json(request): Json<PolicyTestRequest>,
) -> Result<Json<robogate_core::GovernanceDecision>, ApiError> {
    let decision = state.facade.policy_test(&request.telemetry, &request.proposal).await?;
    Ok(Json(decision))
}

/// Body of `POST /plan/generate`.
#[derive(Debug, Deserialize)]
pub struct PlanGenerateRequest {
    /// Free-text instruction, echoed into the generated plan's rationale.
    pub instruction: String,
    /// Navigation goal to plan toward.
    pub goal: Point2,
}

/// `POST /plan/generate`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if telemetry/world cannot be fetched.
pub async fn plan_generate(
    State(state): State<AppState>,
    Json(request): Json<PlanGenerateRequest>,
) -> Result<Json<PlanGenerateOutcome>, ApiError> {
    let outcome = state.facade.plan_generate(&request.instruction, request.goal).await?;
    Ok(Json(outcome))
}

/// Body of `POST /plan/execute`.
#[derive(Debug, Deserialize)]
pub struct PlanExecuteRequest {
    /// Run to append events under; a fresh id is synthesized if omitted.
    pub run_id: Option<RunId>,
    /// The waypoint sequence to govern and execute.
    pub waypoints: Vec<PlanWaypoint>,
    /// Justification recorded on every waypoint's proposal.
    pub rationale: String,
}

/// `POST /plan/execute`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if the event log cannot be written to.
pub async fn plan_execute(
    State(state): State<AppState>,
    Json(request): Json<PlanExecuteRequest>,
) -> Result<Json<PlanExecuteOutcome>, ApiError> {
    let outcome = state.facade.plan_execute(request.run_id, &request.waypoints, &request.rationale).await?;
    Ok(Json(outcome))
}

/// Body of `POST /agent/propose`.
#[derive(Debug, Deserialize)]
pub struct AgentProposeRequest {
    /// Navigation goal the agentic loop should propose toward.
    pub goal: Point2,
}

/// `POST /agent/propose`.
///
/// # Errors
///
/// Returns [`ApiError::Collaborator`] if telemetry/world cannot be fetched
/// or the agentic loop exceeds its wall-clock budget.
pub async fn agent_propose(
    State(state): State<AppState>,
    Json(request): Json<AgentProposeRequest>,
) -> Result<Json<robogate_agent::agentic::AgenticOutcome>, ApiError> {
    let outcome = state.facade.agentic_propose(request.goal).await?;
    Ok(Json(outcome))
}
