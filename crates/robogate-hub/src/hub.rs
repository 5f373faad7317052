// crates/robogate-hub/src/hub.rs
// ============================================================================
// Module: Broadcast Hub
// Description: Per-run multi-subscriber fan-out with bounded buffers and
//              slow-consumer eviction.
// Purpose: Let many observers (WebSocket clients, the CLI, tests) watch a
//          run's telemetry/events/alerts/status/agent-reasoning live,
//          without a slow one stalling the control loop or its peers.
// Dependencies: robogate-core, tokio (sync primitives only), tracing
// ============================================================================

//! ## Overview
//! [`BroadcastHub`] is a thin top-level registry mapping [`RunId`] to a
//! per-run [`RunHub`]; grounded on the teacher's preference for
//! `std::sync::Mutex`-guarded registries over external concurrent-map
//! crates. The top-level registry lock is held only long enough to look up
//! or create a run's [`RunHub`] — publish and subscribe traffic for
//! different runs never contends on one lock, and each run's own
//! subscriber map is serialized independently of every other run's.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use robogate_core::HubMessage;
use robogate_core::HubReceiver;
use robogate_core::RunId;
use robogate_core::SubscriberId;
use robogate_core::interfaces::Hub;
use tokio::sync::mpsc;

/// Default per-subscriber buffer size (§4.6).
pub const DEFAULT_BUFFER_SIZE: usize = 64;
/// Default consecutive-drop count after which a subscriber is evicted (§4.6).
pub const DEFAULT_EVICT_AFTER_DROPS: u32 = 8;

/// One subscriber's delivery state, owned by its [`RunHub`].
struct Subscriber {
    /// The queue [`HubReceiver::recv`] drains from.
    queue: Arc<Mutex<VecDeque<HubMessage>>>,
    /// Wakes the paired [`HubReceiver`]; dropping this ends its stream.
    doorbell: mpsc::Sender<()>,
    /// Consecutive overflow drops since the last clean delivery.
    consecutive_drops: u32,
}

/// Per-run subscriber registry and fan-out.
///
/// # Invariants
/// - Subscribe/unsubscribe/publish for this run are all serialized on
///   `subscribers`, independent of every other run's `RunHub`.
struct RunHub {
    /// Live subscribers for this run, keyed by the id assigned at subscribe time.
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    /// Per-subscriber queue capacity before the oldest message is dropped.
    buffer_size: usize,
    /// Consecutive drops tolerated before a subscriber is evicted.
    evict_after_drops: u32,
}

impl RunHub {
    fn new(buffer_size: usize, evict_after_drops: u32) -> Self {
        Self { subscribers: Mutex::new(HashMap::new()), buffer_size, evict_after_drops }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: SubscriberId, subscriber: Subscriber) {
        self.lock().insert(id, subscriber);
    }

    fn remove(&self, id: SubscriberId) {
        self.lock().remove(&id);
    }

    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers `message` to every current subscriber, dropping the oldest
    /// buffered message for anyone at capacity and evicting anyone who has
    /// dropped `evict_after_drops` times in a row.
    fn publish(&self, message: &HubMessage) {
        let mut subscribers = self.lock();
        let mut evicted = Vec::new();
        for (subscriber_id, subscriber) in subscribers.iter_mut() {
            let was_full = {
                let mut queue = subscriber.queue.lock().unwrap_or_else(PoisonError::into_inner);
                let was_full = queue.len() >= self.buffer_size;
                if was_full {
                    queue.pop_front();
                }
                queue.push_back(message.clone());
                was_full
            };
            if was_full {
                subscriber.consecutive_drops += 1;
                if subscriber.consecutive_drops >= self.evict_after_drops {
                    evicted.push(*subscriber_id);
                    continue;
                }
            } else {
                subscriber.consecutive_drops = 0;
            }
            let _ = subscriber.doorbell.try_send(());
        }
        for subscriber_id in &evicted {
            tracing::warn!(subscriber_id = %subscriber_id, "evicting slow hub subscriber");
            subscribers.remove(subscriber_id);
        }
    }
}

/// The broadcast hub (C6): a [`Hub`] implementation fanning each run's
/// messages out to many independent, bounded subscriber queues.
pub struct BroadcastHub {
    /// Per-run subscriber registries, created lazily on first subscribe.
    runs: Mutex<HashMap<RunId, Arc<RunHub>>>,
    /// Monotonic counter assigning each new subscriber a unique id.
    next_subscriber_id: AtomicU64,
    /// Per-subscriber queue capacity handed to every [`RunHub`] this creates.
    buffer_size: usize,
    /// Consecutive-drop eviction threshold handed to every [`RunHub`] this creates.
    evict_after_drops: u32,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    /// Builds a hub using the default buffer size and eviction threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_BUFFER_SIZE, DEFAULT_EVICT_AFTER_DROPS)
    }

    /// Builds a hub with an explicit per-subscriber buffer size and
    /// consecutive-drop eviction threshold.
    #[must_use]
    pub fn with_limits(buffer_size: usize, evict_after_drops: u32) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
            buffer_size,
            evict_after_drops,
        }
    }

    fn lock_runs(&self) -> MutexGuard<'_, HashMap<RunId, Arc<RunHub>>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_hub(&self, run_id: &RunId) -> Arc<RunHub> {
        let mut runs = self.lock_runs();
        Arc::clone(
            runs.entry(run_id.clone()).or_insert_with(|| Arc::new(RunHub::new(self.buffer_size, self.evict_after_drops))),
        )
    }
}

impl Hub for BroadcastHub {
    fn subscribe(&self, run_id: &RunId) -> (SubscriberId, HubReceiver) {
        let run_hub = self.run_hub(run_id);
        let subscriber_id = SubscriberId::new(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let (doorbell_tx, doorbell_rx) = mpsc::channel(1);
        run_hub.insert(subscriber_id, Subscriber { queue: Arc::clone(&queue), doorbell: doorbell_tx, consecutive_drops: 0 });
        (subscriber_id, HubReceiver::new(queue, doorbell_rx))
    }

    fn unsubscribe(&self, run_id: &RunId, subscriber_id: SubscriberId) {
        let mut runs = self.lock_runs();
        let Some(run_hub) = runs.get(run_id).cloned() else {
            return;
        };
        run_hub.remove(subscriber_id);
        if run_hub.is_empty() {
            runs.remove(run_id);
        }
    }

    fn publish(&self, run_id: &RunId, message: HubMessage) {
        let run_hub = {
            let runs = self.lock_runs();
            runs.get(run_id).cloned()
        };
        let Some(run_hub) = run_hub else {
            return;
        };
        run_hub.publish(&message);
        if run_hub.is_empty() {
            let mut runs = self.lock_runs();
            if runs.get(run_id).is_some_and(|current| Arc::ptr_eq(current, &run_hub)) {
                runs.remove(run_id);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use super::*;

    fn alert(message: &str) -> HubMessage {
        HubMessage::Alert { kind: "test".to_string(), message: message.to_string(), details: None }
    }

    #[tokio::test]
    async fn subscriber_receives_messages_in_publish_order() {
        let hub = BroadcastHub::new();
        let run_id = RunId::new("run-1");
        let (_id, mut receiver) = hub.subscribe(&run_id);
        hub.publish(&run_id, alert("first"));
        hub.publish(&run_id, alert("second"));

        let first = receiver.recv().await.expect("first message");
        let second = receiver.recv().await.expect("second message");
        assert!(matches!(first, HubMessage::Alert { message, .. } if message == "first"));
        assert!(matches!(second, HubMessage::Alert { message, .. } if message == "second"));
    }

    #[tokio::test]
    async fn overflow_drops_the_oldest_message() {
        let hub = BroadcastHub::with_limits(2, DEFAULT_EVICT_AFTER_DROPS);
        let run_id = RunId::new("run-2");
        let (_id, mut receiver) = hub.subscribe(&run_id);
        hub.publish(&run_id, alert("one"));
        hub.publish(&run_id, alert("two"));
        hub.publish(&run_id, alert("three"));

        let first = receiver.recv().await.expect("oldest surviving message");
        assert!(matches!(first, HubMessage::Alert { message, .. } if message == "two"));
        let second = receiver.recv().await.expect("newest message");
        assert!(matches!(second, HubMessage::Alert { message, .. } if message == "three"));
    }

    #[tokio::test]
    async fn subscriber_is_evicted_after_consecutive_drops() {
        let hub = BroadcastHub::with_limits(1, 3);
        let run_id = RunId::new("run-3");
        let (_id, mut receiver) = hub.subscribe(&run_id);
        for index in 0 .. 10 {
            hub.publish(&run_id, alert(&format!("msg-{index}")));
        }

        // Eviction drops the subscriber's sender; recv drains whatever is
        // left in its queue, then observes the stream end.
        while receiver.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn unsubscribe_stops_further_delivery() {
        let hub = BroadcastHub::new();
        let run_id = RunId::new("run-4");
        let (subscriber_id, mut receiver) = hub.subscribe(&run_id);
        hub.unsubscribe(&run_id, subscriber_id);
        hub.publish(&run_id, alert("missed"));
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn independent_subscribers_each_receive_every_message() {
        let hub = BroadcastHub::new();
        let run_id = RunId::new("run-5");
        let (_id_a, mut receiver_a) = hub.subscribe(&run_id);
        let (_id_b, mut receiver_b) = hub.subscribe(&run_id);
        hub.publish(&run_id, alert("broadcast"));

        assert!(receiver_a.recv().await.is_some());
        assert!(receiver_b.recv().await.is_some());
    }
}
