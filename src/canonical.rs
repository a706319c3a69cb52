//! Canonical serialization for deterministic fingerprints.
//!
//! Alignment tables, kernel configuration and graph-state snapshots are
//! fingerprinted so that repeated runs over the same graph can be compared
//! byte for byte.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap/BTreeSet for maps in hashed data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Fingerprinted values are [`AlignmentTable`](crate::types::AlignmentTable),
/// [`KernelConfig`](crate::config::KernelConfig) and the base graph tuple of
/// readings, sequence edges and relation edges. Witness sets and layer maps
/// inside them are `BTreeSet`/`BTreeMap` keyed by sigil or layer name, so two
/// graphs that received the same annotations in a different order produce the
/// same bytes. None of these types can fail to serialize.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// xxh64 of the canonical bytes, seed 0.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// [`canonical_hash`] as 16 lowercase hex digits; the fingerprint format.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
