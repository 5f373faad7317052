// crates/robogate-core/src/errors.rs
// ============================================================================
// Module: Robogate Error Taxonomy
// Description: The shared error kinds crossing every fallback boundary (§7).
// Purpose: Give every crate in the workspace one vocabulary for recoverable
//          vs. fatal failure, instead of ad hoc Strings or panics.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! §7 names error kinds by behavior, not by type name. This module gives
//! each kind a concrete variant so callers can match on it; the kinds that
//! are "not an error to the producer" (`Backpressure`, `StopRequested`) are
//! represented as ordinary values elsewhere rather than as [`RobogateError`]
//! variants — see the hub and runtime crates.

use thiserror::Error;

/// Error kinds shared across the governance layer's fallback boundaries.
#[derive(Debug, Error)]
pub enum RobogateError {
    /// A simulator or planner call timed out or returned a server error.
    /// Recoverable: skip the tick (telemetry) or fall back to the
    /// deterministic planner (planner).
    #[error("transient external failure: {0}")]
    TransientExternal(String),

    /// A malformed proposal or telemetry payload crossed a trust boundary.
    /// Treated as `DENIED`/`policy_state=STOP` for that tick.
    #[error("protocol mismatch in field `{field}`: {detail}")]
    ProtocolMismatch {
        /// The offending field name.
        field: String,
        /// Human-readable detail.
        detail: String,
    },

    /// The policy engine itself raised an unhandled error. Per §7 this must
    /// never propagate as a denial-less failure; callers map it to
    /// [`crate::governance::GovernanceDecision::fail_closed`].
    #[error("policy engine failed closed: {0}")]
    PolicyFailureClosed(String),

    /// The event log's hash chain is broken at the given sequence number.
    #[error("hash chain broken at seq {at}")]
    ChainBreak {
        /// The first sequence number whose `prev_hash` no longer matches.
        at: u64,
    },

    /// Two appenders raced on the same run's event log.
    #[error("concurrent append to run {run_id}")]
    ConcurrentAppend {
        /// The run identifier that was raced on.
        run_id: String,
    },

    /// Disk or database unavailable past the configured timeout.
    #[error("fatal storage failure: {0}")]
    Fatal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_break_renders_the_offending_sequence() {
        let err = RobogateError::ChainBreak { at: 11 };
        assert_eq!(err.to_string(), "hash chain broken at seq 11");
    }
}
