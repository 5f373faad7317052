// crates/robogate-agent/src/errors.rs
// ============================================================================
// Module: Agent Errors
// Description: Error kinds specific to planning and the agentic loop.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors the planner or agentic loop can raise.
///
/// These are narrower than [`robogate_core::RobogateError`]: the run
/// service maps any of them onto the wider error taxonomy (typically
/// `ProtocolMismatch` or `TransientExternal`) when bridging into the
/// control loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agentic loop's planner provider returned a proposal that failed
    /// basic shape validation (e.g. a negative speed).
    #[error("planner provider returned a malformed proposal: {0}")]
    MalformedProposal(String),

    /// The agentic loop exceeded its wall-clock budget before terminating.
    #[error("agentic loop exceeded its wall-clock budget of {budget_ms}ms")]
    WallClockExceeded {
        /// The configured budget, in milliseconds.
        budget_ms: u64,
    },
}
