// system-tests/tests/policy_boundary.rs
// ============================================================================
// Suite: Policy Boundary Conditions Over HTTP
// Description: The literal boundary assertions from spec §8 (human at
//              exactly the stop radius, just past the aisle speed limit,
//              just outside the geofence), driven through `/policies/test`
//              instead of calling the policy engine directly.
// ============================================================================

#![allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]

use robogate_core::telemetry::Telemetry;
use robogate_core::telemetry::Zone;
use robogate_core::world::Rect;
use robogate_core::world::World;
use robogate_config::RuntimeConfig;
use system_tests::harness::Harness;

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

fn open_world() -> World {
    World { geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 }, zones: Vec::new(), obstacles: Vec::new(), human: None, bays: Vec::new() }
}

async fn decision_for(harness: &Harness, telemetry: &Telemetry, proposal: serde_json::Value) -> serde_json::Value {
    reqwest::Client::new()
        .post(format!("{}/policies/test", harness.base_url))
        .json(&serde_json::json!({ "telemetry": telemetry, "proposal": proposal }))
        .send()
        .await
        .expect("policy test request")
        .json()
        .await
        .expect("decision body")
}

#[tokio::test]
async fn human_at_exactly_stop_radius_denies() {
    let safety = RuntimeConfig::default().safety;
    let harness = Harness::start(vec![telemetry(Zone::Aisle)], open_world()).await;

    let mut at_boundary = telemetry(Zone::Aisle);
    at_boundary.human_detected = true;
    at_boundary.human_distance_m = safety.stop_radius_m;
    let proposal = serde_json::json!({ "intent": "MOVE_TO", "params": { "x": 1.0, "y": 1.0, "max_speed": 0.3 }, "rationale": "go" });
    let decision = decision_for(&harness, &at_boundary, proposal).await;
    assert_eq!(decision["decision"], "DENIED");
}

#[tokio::test]
async fn human_just_beyond_stop_radius_is_not_denied_by_stop() {
    let safety = RuntimeConfig::default().safety;
    let harness = Harness::start(vec![telemetry(Zone::Aisle)], open_world()).await;

    let mut just_beyond = telemetry(Zone::Aisle);
    just_beyond.human_detected = true;
    just_beyond.human_distance_m = safety.stop_radius_m + 0.01;
    let proposal = serde_json::json!({ "intent": "MOVE_TO", "params": { "x": 1.0, "y": 1.0, "max_speed": 0.3 }, "rationale": "go" });
    let decision = decision_for(&harness, &just_beyond, proposal).await;
    assert_ne!(decision["policy_state"], "STOP");
}

#[tokio::test]
async fn just_over_the_aisle_speed_limit_is_flagged() {
    let safety = RuntimeConfig::default().safety;
    let harness = Harness::start(vec![telemetry(Zone::Aisle)], open_world()).await;

    let proposal = serde_json::json!({
        "intent": "MOVE_TO",
        "params": { "x": 1.0, "y": 1.0, "max_speed": safety.aisle_speed_limit + 0.0001 },
        "rationale": "go"
    });
    let decision = decision_for(&harness, &telemetry(Zone::Aisle), proposal).await;
    assert_ne!(decision["policy_state"], "SAFE");
}

#[tokio::test]
async fn just_outside_the_geofence_is_denied() {
    let world = World { geofence: Rect { min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 }, ..open_world() };
    let harness = Harness::start(vec![telemetry(Zone::Aisle)], world).await;

    let proposal = serde_json::json!({ "intent": "MOVE_TO", "params": { "x": -0.0001, "y": 5.0, "max_speed": 0.3 }, "rationale": "go" });
    let decision = decision_for(&harness, &telemetry(Zone::Aisle), proposal).await;
    assert_eq!(decision["decision"], "DENIED");
}

#[tokio::test]
async fn policy_catalog_listing_is_served() {
    let harness = Harness::start(vec![telemetry(Zone::Aisle)], open_world()).await;
    let policies: Vec<serde_json::Value> =
        reqwest::get(format!("{}/policies", harness.base_url)).await.expect("policies request").json().await.expect("policies body");
    assert_eq!(policies.len(), 7);
    assert!(policies.iter().any(|policy| policy["id"] == "HUMAN_PROX_01"));
}
