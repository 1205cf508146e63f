//! Identifier newtypes for graph entities.
//!
//! [`NoteId`] wraps the document id handed over by the embedding source.
//! Its ordering (plain lexicographic byte order of the string) is the
//! deterministic tie-break used by every ranking step in the workspace.
//! [`EdgeId`] is a dense index into a graph's edge list.

use std::fmt;

use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};

/// Stable note identifier, as supplied by the embedding source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

/// Edge identifier. Dense, assigned in ascending `(source, target)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u32);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        NoteId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        NoteId(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        NoteId(s)
    }
}

// Bridge between EdgeId and petgraph's EdgeIndex<u32>. Graphs are built in
// one pass with edges inserted in id order, so the two coincide.

impl From<EdgeIndex<u32>> for EdgeId {
    fn from(idx: EdgeIndex<u32>) -> Self {
        EdgeId(idx.index() as u32)
    }
}

impl From<EdgeId> for EdgeIndex<u32> {
    fn from(id: EdgeId) -> Self {
        EdgeIndex::new(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_to_edge_index_roundtrip() {
        let idx = EdgeIndex::<u32>::new(42);
        let edge_id = EdgeId::from(idx);
        assert_eq!(edge_id.0, 42);

        let back: EdgeIndex<u32> = edge_id.into();
        assert_eq!(back.index(), 42);
    }

    #[test]
    fn note_id_display() {
        assert_eq!(format!("{}", NoteId::from("n-7")), "n-7");
    }

    #[test]
    fn note_ids_order_lexicographically() {
        let mut ids = vec![NoteId::from("b"), NoteId::from("10"), NoteId::from("2"), NoteId::from("a")];
        ids.sort();
        let order: Vec<&str> = ids.iter().map(NoteId::as_str).collect();
        assert_eq!(order, vec!["10", "2", "a", "b"]);
    }

    #[test]
    fn serde_is_transparent() {
        let id = NoteId::from("note-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"note-1\"");
        let back: NoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let edge = EdgeId(3);
        assert_eq!(serde_json::to_string(&edge).unwrap(), "3");
    }
}
