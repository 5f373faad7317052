// system-tests/tests/scenario_safe_run.rs
// ============================================================================
// Suite: Safe Straight Run (spec §8 scenario 1)
// Description: A mission with no hazards along the way reaches Completed
//              with a clean, verifiable event chain, observed entirely
//              through the HTTP surface.
// ============================================================================

#![allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]

use std::time::Duration;

use robogate_core::telemetry::Point2;
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

fn straight_run_script(goal: Point2, steps: usize) -> Vec<Telemetry> {
    let mut script = Vec::new();
    for step in 0 ..= steps {
        let t = step as f64 / steps as f64;
        script.push(telemetry_at(goal.x * t, goal.y * t));
    }
    script.push(telemetry_at(goal.x, goal.y));
    script
}

async fn wait_for_status(client: &reqwest::Client, base_url: &str, run_id: &str, expected: &str) -> serde_json::Value {
    for _ in 0 .. 200 {
        let run: serde_json::Value =
            client.get(format!("{base_url}/runs/{run_id}")).send().await.expect("get run").json().await.expect("run body");
        if run["status"] == expected {
            return run;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run never reached status `{expected}`");
}

#[tokio::test]
async fn safe_straight_run_reaches_completed_with_a_clean_chain() {
    let goal = Point2::new(3.0, 0.0);
    let mut config = robogate_config::RuntimeConfig::default();
    config.tick_period_ms = 1;
    let harness = Harness::start_with_config(straight_run_script(goal, 10), open_world(), config).await;
    let client = reqwest::Client::new();

    let mission: serde_json::Value = client
        .post(format!("{}/missions", harness.base_url))
        .json(&serde_json::json!({ "title": "straight run", "goal": { "x": goal.x, "y": goal.y } }))
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

    wait_for_status(&client, &harness.base_url, &run_id, "completed").await;

    let events: Vec<serde_json::Value> = client
        .get(format!("{}/runs/{run_id}/events", harness.base_url))
        .send()
        .await
        .expect("list events request")
        .json()
        .await
        .expect("events body");
    assert!(!events.is_empty());
    assert!(events.iter().any(|event| event["type"] == "EXECUTION"));
}
