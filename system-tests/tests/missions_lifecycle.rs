// system-tests/tests/missions_lifecycle.rs
// ============================================================================
// Suite: Mission CRUD and Lifecycle
// Description: Drives mission create/read/update/delete and the start/
//              pause/resume lifecycle through the real HTTP surface.
// ============================================================================

#![allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]

use robogate_core::telemetry::Telemetry;
use robogate_core::telemetry::Zone;
use robogate_core::world::Rect;
use robogate_core::world::World;
use system_tests::harness::Harness;

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

fn open_world() -> World {
    World { geofence: Rect { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 }, zones: Vec::new(), obstacles: Vec::new(), human: None, bays: Vec::new() }
}

#[tokio::test]
async fn creating_and_completing_the_crud_surface() {
    let harness = Harness::start(vec![telemetry_at(0.0, 0.0)], open_world()).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{}/missions", harness.base_url))
        .json(&serde_json::json!({ "title": "deliver pallet", "goal": { "x": 5.0, "y": 0.0 } }))
        .send()
        .await
        .expect("create request")
        .json()
        .await
        .expect("create body");
    let mission_id = created["id"].as_str().expect("mission id").to_string();
    assert_eq!(created["title"], "deliver pallet");
    assert!(created["active_run_id"].is_null());

    let list: Vec<serde_json::Value> =
        client.get(format!("{}/missions", harness.base_url)).send().await.expect("list request").json().await.expect("list body");
    assert_eq!(list.len(), 1);

    let updated: serde_json::Value = client
        .patch(format!("{}/missions/{mission_id}", harness.base_url))
        .json(&serde_json::json!({ "title": "deliver pallet to bay 3" }))
        .send()
        .await
        .expect("update request")
        .json()
        .await
        .expect("update body");
    assert_eq!(updated["title"], "deliver pallet to bay 3");

    let delete_status = client.delete(format!("{}/missions/{mission_id}", harness.base_url)).send().await.expect("delete request").status();
    assert!(delete_status.is_success());

    let not_found_status = client.get(format!("{}/missions/{mission_id}", harness.base_url)).send().await.expect("get request").status();
    assert_eq!(not_found_status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn start_pause_resume_transitions_the_active_run() {
    let harness = Harness::start(vec![telemetry_at(0.0, 0.0)], open_world()).await;
    let client = reqwest::Client::new();

    let mission: serde_json::Value = client
        .post(format!("{}/missions", harness.base_url))
        .json(&serde_json::json!({ "title": "loop forever", "goal": { "x": 100.0, "y": 0.0 } }))
        .send()
        .await
        .expect("create request")
        .json()
        .await
        .expect("create body");
    let mission_id = mission["id"].as_str().expect("mission id").to_string();

    let started: serde_json::Value = client
        .post(format!("{}/missions/{mission_id}/start", harness.base_url))
        .send()
        .await
        .expect("start request")
        .json()
        .await
        .expect("start body");
    let run_id = started["run_id"].as_str().expect("run id").to_string();

    let run: serde_json::Value =
        client.get(format!("{}/runs/{run_id}", harness.base_url)).send().await.expect("get run").json().await.expect("run body");
    assert_eq!(run["status"], "running");

    let paused: serde_json::Value = client
        .post(format!("{}/missions/{mission_id}/pause", harness.base_url))
        .send()
        .await
        .expect("pause request")
        .json()
        .await
        .expect("pause body");
    assert_eq!(paused["run_id"], run_id);

    let resumed_status =
        client.post(format!("{}/missions/{mission_id}/resume", harness.base_url)).send().await.expect("resume request").status();
    assert!(resumed_status.is_success());
}

#[tokio::test]
async fn unknown_mission_start_returns_not_found() {
    let harness = Harness::start(vec![telemetry_at(0.0, 0.0)], open_world()).await;
    let client = reqwest::Client::new();

    let status =
        client.post(format!("{}/missions/does-not-exist/start", harness.base_url)).send().await.expect("start request").status();
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}
