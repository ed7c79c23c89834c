//! Deterministic state hashing for replica comparison
//!
//! A snapshot is serialized to canonical JSON (every map in it is a
//! `BTreeMap`, so key order is stable) and the string is hashed. Replicas
//! that agree on every replicated field agree on the hash.

use crate::game::snapshot::StateSnapshot;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a deterministic hash of a snapshot
pub fn compute_state_hash(snapshot: &StateSnapshot) -> u64 {
    let canonical = match serde_json::to_string(snapshot) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to serialize snapshot for hashing: {}", e);
            return 0;
        }
    };

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

/// Format a hash for display (shows first 8 hex digits)
pub fn format_hash(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}
