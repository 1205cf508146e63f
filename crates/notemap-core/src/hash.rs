//! Deterministic graph fingerprints using blake3.
//!
//! The fingerprint covers node ids and edges (endpoints plus the exact weight
//! bits), both in ascending order, so two graphs with the same structure and
//! weights always hash the same. Display metadata and layout state are not
//! hashed. Layout seeds its random number generator from the fingerprint,
//! which is what makes identical graphs lay out identically.

use crate::graph::NoteGraph;

/// blake3 digest of a graph's structure and weights.
pub fn graph_fingerprint(graph: &NoteGraph) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(graph.node_count() as u64).to_le_bytes());
    for id in graph.ids() {
        hash_str(&mut hasher, id.as_str());
    }
    hasher.update(&(graph.edge_count() as u64).to_le_bytes());
    // Edge ids are assigned in ascending (source, target) order.
    for edge in graph.edges() {
        hash_str(&mut hasher, edge.source.as_str());
        hash_str(&mut hasher, edge.target.as_str());
        hasher.update(&edge.weight.to_bits().to_le_bytes());
    }
    hasher.finalize()
}

/// Length-prefixed so that ("ab", "c") and ("a", "bc") differ.
fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Folds the first eight bytes of a digest into a `u64` seed.
pub fn seed_from(hash: &blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
