// system-tests/tests/scenario_hub_eviction.rs
// ============================================================================
// Suite: Slow Subscriber Eviction Under Concurrent Publish (spec §8 scenario 6)
// Description: Exercises BroadcastHub the way a live run actually drives it
//              — many tasks publishing concurrently rather than one
//              sequential caller — wired with the config-derived limits a
//              real process would use instead of the hub's own defaults.
// ============================================================================

#![allow(clippy::expect_used, clippy::panic, reason = "test-only assertions")]

use std::sync::Arc;

use robogate_core::HubMessage;
use robogate_core::RunId;
use robogate_core::RunStatus;
use robogate_core::interfaces::Hub;
use robogate_hub::BroadcastHub;

fn status_message() -> HubMessage {
    HubMessage::Status(RunStatus::Running)
}

#[tokio::test]
async fn a_non_consuming_subscriber_is_evicted_under_concurrent_publish() {
    let mut config = robogate_config::RuntimeConfig::default();
    config.hub.subscriber_buffer = 4;
    config.hub.slow_sub_evict = 3;
    let hub: Arc<dyn Hub> = Arc::new(BroadcastHub::with_limits(config.hub.subscriber_buffer, config.hub.slow_sub_evict));
    let run_id = RunId::new("run-concurrent-evict");

    let (_subscriber_id, mut receiver) = hub.subscribe(&run_id);

    let mut publishers = Vec::new();
    for task in 0 .. 8u32 {
        let hub = Arc::clone(&hub);
        let run_id = run_id.clone();
        publishers.push(tokio::spawn(async move {
            for _ in 0 .. 20 {
                hub.publish(&run_id, status_message());
            }
            task
        }));
    }
    for publisher in publishers {
        publisher.await.expect("publisher task");
    }

    // The subscriber never drained its queue while 160 messages were
    // published concurrently across `buffer_size=4`/`evict_after_drops=3`;
    // it must have been evicted, so recv() now observes a closed stream.
    assert!(receiver.recv().await.is_none());
}

#[tokio::test]
async fn independent_subscribers_are_unaffected_by_a_peer_eviction() {
    let hub: Arc<dyn Hub> = Arc::new(BroadcastHub::with_limits(4, 3));
    let run_id = RunId::new("run-independent");

    let (_slow_id, mut slow_receiver) = hub.subscribe(&run_id);
    let (_fast_id, mut fast_receiver) = hub.subscribe(&run_id);

    let drainer = {
        let run_id = run_id.clone();
        tokio::spawn(async move {
            let mut received = 0;
            while received < 40 {
                if fast_receiver.recv().await.is_some() {
                    received += 1;
                } else {
                    break;
                }
            }
            (received, run_id)
        })
    };

    for _ in 0 .. 40 {
        hub.publish(&run_id, status_message());
        tokio::task::yield_now().await;
    }

    let (received, _run_id) = drainer.await.expect("drainer task");
    assert_eq!(received, 40, "a subscriber that keeps up must receive every message");
    assert!(slow_receiver.recv().await.is_none(), "the never-draining peer must still have been evicted");
}
