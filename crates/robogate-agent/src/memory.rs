// crates/robogate-agent/src/memory.rs
// ============================================================================
// Module: Agent Memory
// Description: Ring buffer of the last K proposal/decision pairs, and a
//              rollup used to decide when to force a graceful stop.
// Dependencies: robogate-core
// ============================================================================

//! ## Overview
//! The agentic loop (§4.4.b) consults [`AgentMemory::summary`] after every
//! governed proposal to decide whether `denial_count` has crossed the
//! forced-stop threshold. The buffer itself never grows past its capacity;
//! the oldest entry is evicted to make room for the newest.

use std::collections::VecDeque;

use robogate_core::Decision;
use robogate_core::GovernanceDecision;
use robogate_core::proposal::ActionProposal;
use serde::Serialize;

/// Default ring buffer capacity (§4.4.b: `K=10`).
pub const DEFAULT_CAPACITY: usize = 10;

/// One governed proposal, as recorded into memory.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    /// The proposal that was governed.
    pub proposal: ActionProposal,
    /// The resulting decision.
    pub decision: GovernanceDecision,
}

/// A rollup of the current memory contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySummary {
    /// Total entries currently held (at most the buffer's capacity).
    pub total_entries: usize,
    /// Entries whose decision was `APPROVED`.
    pub approved: usize,
    /// Entries whose decision was `DENIED`.
    pub denied: usize,
    /// Consecutive `DENIED` entries trailing the most recent entry.
    pub denial_count: usize,
}

/// Fixed-capacity ring buffer of governed proposals.
#[derive(Debug, Clone)]
pub struct AgentMemory {
    capacity: usize,
    entries: VecDeque<MemoryEntry>,
}

impl AgentMemory {
    /// Creates an empty memory with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: VecDeque::with_capacity(capacity.max(1)) }
    }

    /// Records a governed proposal, evicting the oldest entry if full.
    pub fn record(&mut self, proposal: ActionProposal, decision: GovernanceDecision) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(MemoryEntry { proposal, decision });
    }

    /// Returns the current rollup.
    #[must_use]
    pub fn summary(&self) -> MemorySummary {
        let total_entries = self.entries.len();
        let approved = self.entries.iter().filter(|entry| entry.decision.decision == Decision::Approved).count();
        let denied = self.entries.iter().filter(|entry| entry.decision.decision == Decision::Denied).count();
        let denial_count = self
            .entries
            .iter()
            .rev()
            .take_while(|entry| entry.decision.decision == Decision::Denied)
            .count();
        MemorySummary { total_entries, approved, denied, denial_count }
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use robogate_core::GovernanceDecision;
    use robogate_core::proposal::Intent;

    use super::*;

    fn approved(note: &str) -> (ActionProposal, GovernanceDecision) {
        (ActionProposal::new(Intent::Wait, note), GovernanceDecision::safe())
    }

    fn denied(note: &str) -> (ActionProposal, GovernanceDecision) {
        (ActionProposal::new(Intent::Wait, note), GovernanceDecision::fail_closed())
    }

    #[test]
    fn evicts_oldest_entry_past_capacity() {
        let mut memory = AgentMemory::new(2);
        let (p1, d1) = approved("first");
        let (p2, d2) = approved("second");
        let (p3, d3) = approved("third");
        memory.record(p1, d1);
        memory.record(p2, d2);
        memory.record(p3, d3);
        assert_eq!(memory.summary().total_entries, 2);
        assert_eq!(memory.iter().next().map(|e| e.proposal.rationale.as_str()), Some("second"));
    }

    #[test]
    fn denial_count_only_counts_trailing_consecutive_denials() {
        let mut memory = AgentMemory::new(10);
        let (p1, d1) = denied("d1");
        let (p2, d2) = approved("a1");
        let (p3, d3) = denied("d2");
        let (p4, d4) = denied("d3");
        memory.record(p1, d1);
        memory.record(p2, d2);
        memory.record(p3, d3);
        memory.record(p4, d4);
        let summary = memory.summary();
        assert_eq!(summary.denial_count, 2);
        assert_eq!(summary.denied, 3);
        assert_eq!(summary.approved, 1);
    }
}
