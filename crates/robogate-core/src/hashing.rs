// crates/robogate-core/src/hashing.rs
// ============================================================================
// Module: Robogate Canonical Hashing
// Description: RFC 8785 JSON canonicalization and SHA-256 content hashing.
// Purpose: Give every event a deterministic digest so the event log chain is
//          tamper-evident and independently reproducible.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every event appended to a run's log is hashed over its RFC 8785 (JCS)
//! canonical JSON form. Canonicalization sorts object keys, drops
//! insignificant whitespace, and rejects values serde_json cannot represent
//! losslessly (non-finite floats in particular, per §4.1).

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

/// Supported hash algorithms for the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 digest, the sole algorithm used by the event log chain.
    Sha256,
}

/// Default hash algorithm for newly created event logs.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// A content digest, carrying both the algorithm and the lowercase hex value.
///
/// Serializes on the wire as a bare lowercase hex string (the on-disk schema
/// in §6 stores `prev_hash`/`hash` as `CHAR(64)`); only [`HashAlgorithm::Sha256`]
/// is currently supported, so the algorithm tag need not travel with the value.
///
/// # Invariants
/// - `value` is always lowercase hex with even length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Builds a digest from raw hash output bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// The all-zero genesis digest used as `prev_hash` for a run's first event.
    #[must_use]
    pub fn genesis(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            value: "0".repeat(64),
        }
    }

    /// Returns the lowercase hex representation of this digest.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.value
    }

    /// Parses a digest from its lowercase hex wire form, assuming SHA-256.
    #[must_use]
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self { algorithm: HashAlgorithm::Sha256, value: value.into() }
    }
}

impl Serialize for HashDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for HashDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_hex(raw))
    }
}

/// Errors raised while canonicalizing or hashing a value.
#[derive(Debug, Error)]
pub enum HashError {
    /// The value could not be canonicalized, e.g. it contains a non-finite
    /// float (`NaN` or `Infinity`) which RFC 8785 cannot represent.
    #[error("value is not canonicalizable: {0}")]
    Canonicalization(String),
}

/// Returns the RFC 8785 canonical JSON bytes for a serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] if the value cannot be serialized
/// to canonical JSON, including when it contains non-finite floating point
/// numbers.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of a serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] under the same conditions as
/// [`canonical_json_bytes`].
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes directly, with no canonicalization step.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test-only assertions"
)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::Map;
    use serde_json::Value;
    use serde_json::json;

    use super::*;

    #[test]
    fn canonical_hash_is_order_independent_for_maps() {
        let mut map_a = Map::new();
        map_a.insert("b".to_string(), json!(2));
        map_a.insert("a".to_string(), json!(1));

        let mut map_b = Map::new();
        map_b.insert("a".to_string(), json!(1));
        map_b.insert("b".to_string(), json!(2));

        let hash_a = hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_a)).expect("hash a");
        let hash_b = hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_b)).expect("hash b");

        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn canonical_hash_rejects_non_finite_floats() {
        #[derive(Serialize)]
        struct WithNan {
            value: f64,
        }

        let payload = WithNan { value: f64::NAN };
        let result = hash_canonical_json(HashAlgorithm::Sha256, &payload);
        assert!(matches!(result, Err(HashError::Canonicalization(_))));
    }

    #[test]
    fn hash_bytes_is_deterministic() {
        let map: BTreeMap<&str, i32> = BTreeMap::from([("a", 1)]);
        let bytes = canonical_json_bytes(&map).expect("serialize");
        let first = hash_bytes(HashAlgorithm::Sha256, &bytes);
        let second = hash_bytes(HashAlgorithm::Sha256, &bytes);
        assert_eq!(first, second);
    }
}
