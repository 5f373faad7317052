// crates/robogate-eventlog-sqlite/src/lib.rs
// ============================================================================
// Crate: robogate-eventlog-sqlite
// Description: SQLite-backed, hash-chained, append-only event log (C2).
// ============================================================================

//! # robogate-eventlog-sqlite
//!
//! A durable [`robogate_core::interfaces::EventLogStore`] implementation.
//! Every append goes through a single writer thread so `seq` allocation and
//! hash chaining within one run never race; reads use a round-robin pool of
//! read-only connections isolated from the writer under `SQLite` WAL.

pub mod errors;
pub mod store;

pub use errors::EventLogError;
pub use store::RunLogSummary;
pub use store::SqliteEventLogConfig;
pub use store::SqliteEventLogStore;
