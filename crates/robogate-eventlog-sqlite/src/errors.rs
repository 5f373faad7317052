// crates/robogate-eventlog-sqlite/src/errors.rs
// ============================================================================
// Module: Event Log Storage Errors
// Description: Error kinds specific to the SQLite event log's storage layer.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors raised by the `SQLite` event log before being mapped onto
/// [`robogate_core::RobogateError`] at the [`crate::store::SqliteEventLogStore`]
/// trait boundary.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// The configured path or its parent directory could not be prepared.
    #[error("event log io error: {0}")]
    Io(String),

    /// The `SQLite` engine itself reported an error.
    #[error("event log db error: {0}")]
    Db(String),

    /// A stored event's canonical form could not be serialized or hashed.
    #[error("event log canonicalization error: {0}")]
    Canonicalization(String),

    /// The writer thread's command channel has shut down.
    #[error("event log writer is no longer accepting commands")]
    WriterShutDown,

    /// Two appenders raced on the same run.
    #[error("concurrent append to run {run_id}")]
    ConcurrentAppend {
        /// The run that was raced on.
        run_id: String,
    },
}

impl From<EventLogError> for robogate_core::RobogateError {
    fn from(error: EventLogError) -> Self {
        match error {
            EventLogError::ConcurrentAppend { run_id } => Self::ConcurrentAppend { run_id },
            other => Self::Fatal(other.to_string()),
        }
    }
}
