//! Undirected similarity edges.
//!
//! An [`Edge`] joins two distinct notes. Endpoints are stored normalised
//! (`source < target`) so an unordered pair has exactly one representation;
//! this is what makes duplicate detection a plain key comparison.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NoteId};

/// A similarity edge between two notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NoteId,
    pub target: NoteId,
    /// Cosine similarity of the endpoints, in `[0, 1]`.
    pub weight: f32,
}

impl Edge {
    /// Returns the endpoint opposite `id`, or `None` if `id` is not an endpoint.
    pub fn other(&self, id: &NoteId) -> Option<&NoteId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn touches(&self, id: &NoteId) -> bool {
        &self.source == id || &self.target == id
    }

    pub fn key(&self) -> (&NoteId, &NoteId) {
        (&self.source, &self.target)
    }
}

/// Orders an unordered pair so the smaller id comes first.
pub fn normalize_pair(a: NoteId, b: NoteId) -> (NoteId, NoteId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str) -> Edge {
        let (source, target) = normalize_pair(a.into(), b.into());
        Edge {
            id: EdgeId(0),
            source,
            target,
            weight: 0.5,
        }
    }

    #[test]
    fn pair_is_normalized() {
        let e = edge("z", "a");
        assert_eq!(e.source, NoteId::from("a"));
        assert_eq!(e.target, NoteId::from("z"));
        assert_eq!(edge("a", "z").key(), e.key());
    }

    #[test]
    fn other_endpoint() {
        let e = edge("a", "b");
        assert_eq!(e.other(&"a".into()), Some(&NoteId::from("b")));
        assert_eq!(e.other(&"b".into()), Some(&NoteId::from("a")));
        assert_eq!(e.other(&"c".into()), None);
        assert!(e.touches(&"a".into()));
        assert!(!e.touches(&"c".into()));
    }
}
