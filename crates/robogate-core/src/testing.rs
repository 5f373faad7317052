// crates/robogate-core/src/testing.rs
// ============================================================================
// Module: In-Memory Event Log
// Description: A non-persistent EventLogStore used by tests across the
//              workspace (runtime, server, system-tests).
// Purpose: Exercise the append/list/verify contract without a filesystem,
//          matching the same hashing and linkage rules as the sqlite-backed
//          store (§9 test tooling).
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! [`InMemoryEventLogStore`] implements [`crate::interfaces::EventLogStore`]
//! over a plain `Mutex<HashMap<RunId, Vec<Event>>>`. It is not behind
//! `#[cfg(test)]`: crates across the workspace depend on it as an ordinary
//! (non-dev) dependency so integration tests in other crates can use it too.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::errors::RobogateError;
use crate::event::Event;
use crate::event::EventPayload;
use crate::hashing::DEFAULT_HASH_ALGORITHM;
use crate::hashing::HashDigest;
use crate::hashing::hash_canonical_json;
use crate::identifiers::EventId;
use crate::identifiers::RunId;
use crate::interfaces::ChainVerification;
use crate::interfaces::EventLogStore;
use crate::time::MonotonicClock;

/// An in-memory, single-process [`EventLogStore`].
///
/// Applies the same `seq`/`prev_hash`/`hash` linkage rules as the
/// sqlite-backed store, so chain verification behaves identically; it just
/// never touches disk.
pub struct InMemoryEventLogStore {
    runs: Mutex<HashMap<RunId, Vec<Event>>>,
    clock: MonotonicClock,
    next_event_seq: AtomicU64,
}

impl InMemoryEventLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { runs: Mutex::new(HashMap::new()), clock: MonotonicClock::new(), next_event_seq: AtomicU64::new(1) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RunId, Vec<Event>>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryEventLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLogStore for InMemoryEventLogStore {
    async fn append(&self, run_id: &RunId, payload: EventPayload) -> Result<Event, RobogateError> {
        let mut runs = self.lock();
        let events = runs.entry(run_id.clone()).or_default();
        let seq = events.last().map_or(1, |last| last.seq + 1);
        let prev_hash = events.last().map_or_else(|| HashDigest::genesis(DEFAULT_HASH_ALGORITHM), |last| last.hash.clone());
        let id_seq = self.next_event_seq.fetch_add(1, Ordering::Relaxed);

        let mut event = Event {
            seq,
            id: EventId::new(format!("evt-{id_seq:016x}")),
            run_id: run_id.clone(),
            ts: self.clock.now(),
            payload,
            prev_hash,
            hash: HashDigest::genesis(DEFAULT_HASH_ALGORITHM),
        };
        event.hash = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &event.hash_preimage())
            .map_err(|err| RobogateError::Fatal(err.to_string()))?;

        events.push(event.clone());
        Ok(event)
    }

    async fn list(&self, run_id: &RunId, since_seq: Option<u64>) -> Result<Vec<Event>, RobogateError> {
        let events = self.lock().get(run_id).cloned().unwrap_or_default();
        Ok(match since_seq {
            Some(since) => events.into_iter().filter(|event| event.seq > since).collect(),
            None => events,
        })
    }

    async fn verify(&self, run_id: &RunId) -> Result<ChainVerification, RobogateError> {
        let events = self.lock().get(run_id).cloned().unwrap_or_default();
        let mut expected_prev = HashDigest::genesis(DEFAULT_HASH_ALGORITHM);
        for event in &events {
            if event.prev_hash != expected_prev {
                return Ok(ChainVerification { ok: false, break_at: Some(event.seq) });
            }
            expected_prev = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &event.hash_preimage())
                .map_err(|err| RobogateError::Fatal(err.to_string()))?;
        }
        Ok(ChainVerification { ok: true, break_at: None })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appended_chain_verifies_clean() {
        let store = InMemoryEventLogStore::new();
        let run_id = RunId::new("run-1");
        for _ in 0 .. 5 {
            store
                .append(&run_id, EventPayload::Alert { kind: "test".to_string(), message: "tick".to_string(), details: None })
                .await
                .expect("append");
        }
        let verification = store.verify(&run_id).await.expect("verify");
        assert!(verification.ok);
        assert_eq!(store.list(&run_id, None).await.expect("list").len(), 5);
    }

    #[tokio::test]
    async fn since_seq_filters_earlier_events() {
        let store = InMemoryEventLogStore::new();
        let run_id = RunId::new("run-1");
        for _ in 0 .. 3 {
            store
                .append(&run_id, EventPayload::Alert { kind: "test".to_string(), message: "tick".to_string(), details: None })
                .await
                .expect("append");
        }
        let tail = store.list(&run_id, Some(1)).await.expect("list");
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].seq, 2);
    }

    #[tokio::test]
    async fn tampering_a_stored_event_breaks_verification() {
        let store = InMemoryEventLogStore::new();
        let run_id = RunId::new("run-1");
        for _ in 0 .. 3 {
            store
                .append(&run_id, EventPayload::Alert { kind: "test".to_string(), message: "tick".to_string(), details: None })
                .await
                .expect("append");
        }
        {
            let mut runs = store.lock();
            let events = runs.get_mut(&run_id).expect("run present");
            events[0].payload =
                EventPayload::Alert { kind: "tampered".to_string(), message: "tampered".to_string(), details: None };
        }
        let verification = store.verify(&run_id).await.expect("verify");
        assert!(!verification.ok);
        assert_eq!(verification.break_at, Some(2));
    }
}
