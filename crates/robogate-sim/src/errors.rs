// crates/robogate-sim/src/errors.rs
// ============================================================================
// Module: Simulator Adapter Errors
// Description: Error kinds specific to the HTTP simulator client.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors the HTTP simulator client can raise. Callers (the control loop)
/// map every variant onto [`robogate_core::RobogateError::TransientExternal`]
/// per §4.5/§7: a simulator fault is always recoverable within one tick.
#[derive(Debug, Error)]
pub enum SimError {
    /// The request did not complete within the configured timeout.
    #[error("simulator call to {endpoint} timed out after {timeout_ms}ms")]
    Timeout {
        /// The endpoint that timed out.
        endpoint: String,
        /// The configured timeout, in milliseconds.
        timeout_ms: u64,
    },

    /// The simulator returned a non-success HTTP status.
    #[error("simulator call to {endpoint} returned status {status}")]
    Http {
        /// The endpoint that failed.
        endpoint: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The response body could not be parsed as the expected shape.
    #[error("simulator response from {endpoint} was malformed: {detail}")]
    MalformedResponse {
        /// The endpoint that returned the malformed body.
        endpoint: String,
        /// Human-readable parse failure detail.
        detail: String,
    },

    /// The transport itself failed (connection refused, DNS failure, etc.).
    #[error("simulator transport error calling {endpoint}: {detail}")]
    Transport {
        /// The endpoint that failed.
        endpoint: String,
        /// Human-readable transport failure detail.
        detail: String,
    },
}
