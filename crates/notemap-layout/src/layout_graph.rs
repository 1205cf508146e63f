//! Dense, index-based view of a [`NoteGraph`] for the layout inner loops.
//!
//! Node `i` is the `i`-th node in ascending id order. `NoteGraph` inserts its
//! nodes sorted, so petgraph's `NodeIndex(i)` is that same node; the view
//! relies on this to avoid any id lookups while iterating.

use petgraph::visit::EdgeRef;

use notemap_core::{NoteGraph, NoteId};

/// Adjacency and degree arrays indexed by id rank.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    ids: Vec<NoteId>,
    degree: Vec<usize>,
    /// Neighbours of each node with edge weight, ascending by index.
    adjacency: Vec<Vec<(usize, f32)>>,
    /// `(low, high, weight)` per edge, in edge id order.
    edges: Vec<(usize, usize, f32)>,
}

impl LayoutGraph {
    pub fn from_graph(graph: &NoteGraph) -> Self {
        let inner = graph.inner();
        let ids: Vec<NoteId> = graph.ids().cloned().collect();
        let degree: Vec<usize> = graph.nodes().map(|n| n.degree).collect();

        let mut adjacency = vec![Vec::new(); ids.len()];
        let mut edges = Vec::with_capacity(inner.edge_count());
        for edge in inner.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let (low, high) = if a < b { (a, b) } else { (b, a) };
            let weight = edge.weight().weight;
            adjacency[low].push((high, weight));
            adjacency[high].push((low, weight));
            edges.push((low, high, weight));
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(j, _)| j);
        }

        LayoutGraph {
            ids,
            degree,
            adjacency,
            edges,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NoteId] {
        &self.ids
    }

    pub fn id(&self, i: usize) -> &NoteId {
        &self.ids[i]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.degree[i]
    }

    pub fn neighbors(&self, i: usize) -> &[(usize, f32)] {
        &self.adjacency[i]
    }

    pub fn edges(&self) -> &[(usize, usize, f32)] {
        &self.edges
    }

    /// Node indices ordered by degree descending, index ascending.
    pub fn degree_ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.degree[b].cmp(&self.degree[a]).then(a.cmp(&b)));
        order
    }

    /// The highest-degree node, lowest id on ties.
    pub fn hub(&self) -> Option<usize> {
        self.degree_ranking().first().copied()
    }
}
