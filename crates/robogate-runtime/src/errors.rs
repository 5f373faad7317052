// crates/robogate-runtime/src/errors.rs
// ============================================================================
// Module: Run Service Errors
// Description: Error kinds specific to run lifecycle management (C7).
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

use robogate_core::RunId;

/// Errors raised by [`crate::registry::RunRegistry`] and the control loop
/// wiring around it.
///
/// These are distinct from [`robogate_core::RobogateError`]: that taxonomy
/// describes what can go wrong *inside* one tick; this one describes what
/// can go wrong *managing* a run's lifecycle (§4.7, §9 "explicit registry").
#[derive(Debug, Error)]
pub enum RunServiceError {
    /// `start_run` was called for a run id that already has an active task.
    /// Per §3's invariant, at most one control task may run per run id.
    #[error("run {run_id} already has an active control task")]
    AlreadyRunning {
        /// The run identifier that was already active.
        run_id: RunId,
    },

    /// A lifecycle operation (`stop_run`, status lookup) named a run id
    /// this registry has no record of.
    #[error("unknown run {run_id}")]
    UnknownRun {
        /// The run identifier that was not found.
        run_id: RunId,
    },

    /// `verify` found a broken hash chain; the run is marked `failed`
    /// per §7 `ChainBreak`.
    #[error("hash chain broken for run {run_id} at seq {at}")]
    ChainBreak {
        /// The run whose chain is broken.
        run_id: RunId,
        /// The first sequence number whose linkage no longer matches.
        at: u64,
    },

    /// The underlying event log or simulator adapter reported a failure
    /// this registry could not recover from.
    #[error("run service storage failure: {0}")]
    Storage(#[from] robogate_core::RobogateError),
}
