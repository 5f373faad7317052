// crates/robogate-runtime/src/ids.rs
// ============================================================================
// Module: Runtime Identifier Generation
// Description: Boot-scoped generator for run and event identifiers.
// Purpose: Give the registry and control loop unique, process-local
//          identifiers without a central allocator.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Grounded on the correlation-id generator pattern: a random per-process
//! seed plus a monotonic counter, rendered as `{prefix}-{boot:016x}-{seq:016x}`.
//! Uniqueness within a process is all callers need; cross-process uniqueness
//! is not required because run and event identifiers are only ever compared
//! within the process that created them.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

/// Boot-scoped, monotonically counted identifier generator.
#[derive(Debug)]
pub struct IdGenerator {
    /// Prefix included in every generated identifier.
    prefix: &'static str,
    /// Random seed drawn once at generator construction.
    boot_id: u64,
    /// Monotonic counter for identifiers issued by this generator.
    counter: AtomicU64,
}

impl IdGenerator {
    /// Creates a new generator issuing identifiers tagged with `prefix`.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let mut bytes = [0_u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self { prefix, boot_id: u64::from_be_bytes(bytes), counter: AtomicU64::new(1) }
    }

    /// Issues the next identifier string.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:016x}-{:016x}", self.prefix, self.boot_id, seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_ids_are_unique_and_carry_the_prefix() {
        let generator = IdGenerator::new("run");
        let a = generator.issue();
        let b = generator.issue();
        assert_ne!(a, b);
        assert!(a.starts_with("run-"));
        assert!(b.starts_with("run-"));
    }
}
