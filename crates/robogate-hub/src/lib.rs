// crates/robogate-hub/src/lib.rs
// ============================================================================
// Crate: robogate-hub
// Description: Per-run broadcast fan-out with bounded buffers and
//              slow-consumer eviction (C6).
// ============================================================================

//! # robogate-hub
//!
//! [`BroadcastHub`] implements [`robogate_core::Hub`]: a per-run,
//! multi-subscriber fan-out channel. Each subscriber owns an independent
//! bounded buffer; a subscriber that falls behind has its oldest message
//! dropped, and is evicted entirely after too many consecutive drops.

pub mod hub;

pub use hub::BroadcastHub;
pub use hub::DEFAULT_BUFFER_SIZE;
pub use hub::DEFAULT_EVICT_AFTER_DROPS;
