//! Highlight propagation.
//!
//! The highlight set of a focused node is the node, its neighbours and the
//! edges joining them. It is computed from the graph's adjacency in
//! O(degree) and never scans the whole graph.

use serde::Serialize;

use notemap_core::{EdgeId, NoteGraph, NoteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSet {
    pub node: NoteId,
    /// Neighbour ids in ascending order.
    pub neighbors: Vec<NoteId>,
    /// Incident edge ids in ascending order.
    pub edges: Vec<EdgeId>,
}

impl HighlightSet {
    /// `None` when `id` is not in the graph.
    pub fn compute(graph: &NoteGraph, id: &NoteId) -> Option<Self> {
        if !graph.contains(id) {
            return None;
        }
        let mut neighbors = Vec::new();
        let mut edges = Vec::new();
        for edge in graph.incident_edges(id) {
            edges.push(edge.id);
            if let Some(other) = edge.other(id) {
                neighbors.push(other.clone());
            }
        }
        neighbors.sort();
        edges.sort();
        Some(HighlightSet {
            node: id.clone(),
            neighbors,
            edges,
        })
    }

    pub fn contains_node(&self, id: &NoteId) -> bool {
        &self.node == id || self.neighbors.binary_search(id).is_ok()
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.binary_search(&id).is_ok()
    }
}

/// Hovered and selected nodes. Hover wins while present; when it clears
/// the selection shows through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
    pub hovered: Option<NoteId>,
    pub selected: Option<NoteId>,
}

impl Focus {
    pub fn effective(&self) -> Option<&NoteId> {
        self.hovered.as_ref().or(self.selected.as_ref())
    }

    /// Forgets ids that fail `keep`.
    pub fn retain<F: Fn(&NoteId) -> bool>(&mut self, keep: F) {
        if self.hovered.as_ref().is_some_and(|id| !keep(id)) {
            self.hovered = None;
        }
        if self.selected.as_ref().is_some_and(|id| !keep(id)) {
            self.selected = None;
        }
    }
}
