// system-tests/tests/scenario_slow_then_compliant.rs
// ============================================================================
// Suite: Human Approaching Slows the Proposal (spec §8 scenario 3)
// Description: A human inside the slow-down radius but outside the hard
//              stop radius is approved only when the proposed speed
//              already respects the slow-band cap, denied/needs-review
//              otherwise, driven through `/policies/test`.
// ============================================================================

#![allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]

use robogate_core::telemetry::Telemetry;
use robogate_core::telemetry::Zone;
use robogate_core::world::Rect;
use robogate_core::world::World;
use system_tests::harness::Harness;

fn approaching_human_telemetry() -> Telemetry {
    Telemetry {
        x: 0.0,
        y: 0.0,
        theta: 0.0,
        speed: 0.0,
        zone: Zone::Aisle,
        nearest_obstacle_m: 10.0,
        human_detected: true,
        human_conf: 0.9,
        human_distance_m: 2.0,
        battery: None,
        target: None,
        events: Vec::new(),
    }
}

fn open_world() -> World {
    World { geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 }, zones: Vec::new(), obstacles: Vec::new(), human: None, bays: Vec::new() }
}

#[tokio::test]
async fn compliant_slow_speed_is_approved() {
    let harness = Harness::start(vec![approaching_human_telemetry()], open_world()).await;
    let client = reqwest::Client::new();

    let decision: serde_json::Value = client
        .post(format!("{}/policies/test", harness.base_url))
        .json(&serde_json::json!({
            "telemetry": approaching_human_telemetry(),
            "proposal": { "intent": "MOVE_TO", "params": { "x": 1.0, "y": 0.0, "max_speed": 0.3 }, "rationale": "approach slowly" }
        }))
        .send()
        .await
        .expect("policy test request")
        .json()
        .await
        .expect("decision body");
    assert_eq!(decision["decision"], "APPROVED");
}

#[tokio::test]
async fn noncompliant_speed_needs_review() {
    let harness = Harness::start(vec![approaching_human_telemetry()], open_world()).await;
    let client = reqwest::Client::new();

    let decision: serde_json::Value = client
        .post(format!("{}/policies/test", harness.base_url))
        .json(&serde_json::json!({
            "telemetry": approaching_human_telemetry(),
            "proposal": { "intent": "MOVE_TO", "params": { "x": 1.0, "y": 0.0, "max_speed": 0.5 }, "rationale": "hurry" }
        }))
        .send()
        .await
        .expect("policy test request")
        .json()
        .await
        .expect("decision body");
    assert_ne!(decision["decision"], "APPROVED");
}
