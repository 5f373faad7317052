// crates/robogate-core/src/identifiers.rs
// ============================================================================
// Module: Robogate Identifiers
// Description: Canonical opaque identifiers for runs, missions, and events.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the opaque identifiers threaded through the
//! governance layer. Identifiers serialize as plain strings on the wire and
//! carry no validation beyond non-emptiness at construction.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Mission identifier, opaque to the governance layer.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(String);

/// Run identifier, opaque to the governance layer.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

/// Event identifier, unique within a run's event log.
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is enforced by the event log, not this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

/// Broadcast-hub subscriber identifier.
///
/// # Invariants
/// - Opaque; assigned by the hub at subscribe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(u64);

macro_rules! opaque_string_id {
    ($ty:ident) => {
        impl $ty {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_string_id!(MissionId);
opaque_string_id!(RunId);
opaque_string_id!(EventId);

impl SubscriberId {
    /// Creates a subscriber identifier from a raw counter value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_id_round_trips_through_display_and_from() {
        let id = MissionId::from("mission-7");
        assert_eq!(id.as_str(), "mission-7");
        assert_eq!(id.to_string(), "mission-7");
    }

    #[test]
    fn subscriber_ids_compare_by_raw_value() {
        assert!(SubscriberId::new(1) < SubscriberId::new(2));
    }
}
