//! NoteGraph: the bounded similarity graph handed to layout and rendering.
//!
//! [`NoteGraph`] wraps an undirected petgraph `Graph` whose node weights are
//! [`Node`]s and whose edge weights are [`Edge`]s, plus an id index and the
//! derived [`GraphStats`]. A graph is built in one shot by
//! [`NoteGraph::from_parts`], which enforces the structural invariants:
//!
//! - no self-loops and at most one edge per unordered pair,
//! - every edge weight finite and within `[0, 1]`,
//! - `degree(n)` equals the number of edges touching `n`.
//!
//! Graphs are immutable once built (apart from copying layout positions in),
//! so a rebuilt graph is always a fresh value. Adjacency is petgraph's, which
//! keeps neighbour queries at O(degree).

use std::collections::BTreeMap;

use indexmap::IndexMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::edge::{normalize_pair, Edge};
use crate::error::CoreError;
use crate::id::{EdgeId, NoteId};
use crate::node::Node;
use crate::position::Position;

/// Document counts feeding the coverage statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coverage {
    /// Documents considered for the graph (after tag filtering).
    pub documents_total: usize,
    /// Considered documents with a usable, dimensionally consistent vector.
    pub documents_embedded: usize,
}

impl Coverage {
    pub fn ratio(&self) -> f32 {
        if self.documents_total == 0 {
            0.0
        } else {
            self.documents_embedded as f32 / self.documents_total as f32
        }
    }
}

/// Derived statistics describing the final (filtered, truncated) graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub avg_degree: f32,
    pub isolated_count: usize,
    pub similarity_min: Option<f32>,
    pub similarity_max: Option<f32>,
    pub documents_total: usize,
    pub documents_embedded: usize,
    pub coverage: f32,
}

impl GraphStats {
    fn compute<'a>(
        nodes: impl Iterator<Item = &'a Node>,
        edges: impl Iterator<Item = &'a Edge>,
        coverage: Coverage,
    ) -> Self {
        let mut node_count = 0usize;
        let mut degree_sum = 0usize;
        let mut isolated_count = 0usize;
        for node in nodes {
            node_count += 1;
            degree_sum += node.degree;
            if node.degree == 0 {
                isolated_count += 1;
            }
        }

        let mut edge_count = 0usize;
        let mut similarity_min: Option<f32> = None;
        let mut similarity_max: Option<f32> = None;
        for edge in edges {
            edge_count += 1;
            similarity_min = Some(similarity_min.map_or(edge.weight, |m| m.min(edge.weight)));
            similarity_max = Some(similarity_max.map_or(edge.weight, |m| m.max(edge.weight)));
        }

        GraphStats {
            node_count,
            edge_count,
            avg_degree: if node_count == 0 {
                0.0
            } else {
                degree_sum as f32 / node_count as f32
            },
            isolated_count,
            similarity_min,
            similarity_max,
            documents_total: coverage.documents_total,
            documents_embedded: coverage.documents_embedded,
            coverage: coverage.ratio(),
        }
    }

    pub fn coverage_counts(&self) -> Coverage {
        Coverage {
            documents_total: self.documents_total,
            documents_embedded: self.documents_embedded,
        }
    }
}

/// Serializable form of a [`NoteGraph`]: nodes in id order, edges in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub stats: GraphStats,
}

/// The bounded, undirected note similarity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct NoteGraph {
    graph: UnGraph<Node, Edge, u32>,
    /// Id lookup, in ascending id order (nodes are inserted sorted).
    index: IndexMap<NoteId, NodeIndex<u32>>,
    stats: GraphStats,
}

impl Default for NoteGraph {
    fn default() -> Self {
        NoteGraph::empty()
    }
}

impl NoteGraph {
    /// An empty graph with zero coverage.
    pub fn empty() -> Self {
        NoteGraph {
            graph: UnGraph::default(),
            index: IndexMap::new(),
            stats: GraphStats::default(),
        }
    }

    /// Builds a graph from nodes and weighted undirected pairs.
    ///
    /// Node degrees in the input are ignored and recomputed. Edges are
    /// normalised, sorted and numbered; any self-loop, duplicate pair, unknown
    /// endpoint or out-of-range weight is rejected.
    pub fn from_parts(
        mut nodes: Vec<Node>,
        edges: Vec<(NoteId, NoteId, f32)>,
        coverage: Coverage,
    ) -> Result<Self, CoreError> {
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut graph = UnGraph::<Node, Edge, u32>::with_capacity(nodes.len(), edges.len());
        let mut index = IndexMap::with_capacity(nodes.len());
        for mut node in nodes {
            if index.contains_key(&node.id) {
                return Err(CoreError::DuplicateNode { id: node.id });
            }
            node.degree = 0;
            let id = node.id.clone();
            let idx = graph.add_node(node);
            index.insert(id, idx);
        }

        let mut pairs: BTreeMap<(NoteId, NoteId), f32> = BTreeMap::new();
        for (a, b, weight) in edges {
            if a == b {
                return Err(CoreError::InvalidEdge {
                    reason: format!("self-loop on {a}"),
                });
            }
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(CoreError::InvalidEdge {
                    reason: format!("weight {weight} for {a}-{b} is outside [0, 1]"),
                });
            }
            for endpoint in [&a, &b] {
                if !index.contains_key(endpoint) {
                    return Err(CoreError::NodeNotFound {
                        id: endpoint.clone(),
                    });
                }
            }
            let key = normalize_pair(a, b);
            if pairs.contains_key(&key) {
                return Err(CoreError::InvalidEdge {
                    reason: format!("duplicate edge {}-{}", key.0, key.1),
                });
            }
            pairs.insert(key, weight);
        }

        for (i, ((source, target), weight)) in pairs.into_iter().enumerate() {
            let a = index[&source];
            let b = index[&target];
            graph.add_edge(
                a,
                b,
                Edge {
                    id: EdgeId(i as u32),
                    source,
                    target,
                    weight,
                },
            );
        }

        for &idx in index.values() {
            let degree = graph.edges(idx).count();
            graph[idx].degree = degree;
        }

        let stats = GraphStats::compute(graph.node_weights(), graph.edge_weights(), coverage);
        Ok(NoteGraph {
            graph,
            index,
            stats,
        })
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Read-only access to the underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<Node, Edge, u32> {
        &self.graph
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_index(&self, id: &NoteId) -> Option<NodeIndex<u32>> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &NoteId) -> Option<&Node> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    pub fn degree(&self, id: &NoteId) -> Option<usize> {
        self.node(id).map(|n| n.degree)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.index.values().map(move |&idx| &self.graph[idx])
    }

    /// Node ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &NoteId> + '_ {
        self.index.keys()
    }

    /// Edges in ascending [`EdgeId`] order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.graph.edge_weights()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.graph.edge_weight(id.into())
    }

    /// Edges touching `id`. O(degree); empty for unknown ids.
    pub fn incident_edges<'a>(&'a self, id: &NoteId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.node_index(id)
            .into_iter()
            .flat_map(move |idx| self.graph.edges(idx).map(|e| e.weight()))
    }

    /// Ids adjacent to `id`. O(degree); empty for unknown ids.
    pub fn neighbors<'a>(&'a self, id: &'a NoteId) -> impl Iterator<Item = &'a NoteId> + 'a {
        self.incident_edges(id).filter_map(move |e| e.other(id))
    }

    // -----------------------------------------------------------------------
    // Layout state
    // -----------------------------------------------------------------------

    /// Copies layout state into the nodes. `lookup` returns the position and
    /// pinned flag for an id, or `None` to leave the node untouched.
    pub fn apply_positions<F>(&mut self, mut lookup: F)
    where
        F: FnMut(&NoteId) -> Option<(Position, bool)>,
    {
        for &idx in self.index.values() {
            let node = &mut self.graph[idx];
            if let Some((position, pinned)) = lookup(&node.id) {
                node.position = position;
                node.pinned = pinned;
            }
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
            stats: self.stats.clone(),
        }
    }
}

impl From<NoteGraph> for GraphSnapshot {
    fn from(graph: NoteGraph) -> Self {
        graph.snapshot()
    }
}

impl TryFrom<GraphSnapshot> for NoteGraph {
    type Error = CoreError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let coverage = snapshot.stats.coverage_counts();
        let edges = snapshot
            .edges
            .into_iter()
            .map(|e| (e.source, e.target, e.weight))
            .collect();
        NoteGraph::from_parts(snapshot.nodes, edges, coverage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id)).collect()
    }

    fn pair(a: &str, b: &str, w: f32) -> (NoteId, NoteId, f32) {
        (a.into(), b.into(), w)
    }

    #[test]
    fn empty_graph_has_zero_coverage() {
        let graph = NoteGraph::empty();
        assert!(graph.is_empty());
        assert_eq!(graph.stats().coverage, 0.0);
        assert_eq!(graph.stats().similarity_min, None);
    }

    #[test]
    fn degrees_match_incident_edges() {
        let graph = NoteGraph::from_parts(
            nodes(&["a", "b", "c", "d"]),
            vec![pair("a", "b", 0.9), pair("c", "a", 0.7)],
            Coverage {
                documents_total: 4,
                documents_embedded: 4,
            },
        )
        .unwrap();

        assert_eq!(graph.degree(&"a".into()), Some(2));
        assert_eq!(graph.degree(&"b".into()), Some(1));
        assert_eq!(graph.degree(&"d".into()), Some(0));
        assert_eq!(graph.stats().isolated_count, 1);
        assert_eq!(graph.stats().avg_degree, 1.0);
        assert_eq!(graph.stats().similarity_min, Some(0.7));
        assert_eq!(graph.stats().similarity_max, Some(0.9));
        assert_eq!(graph.stats().coverage, 1.0);
    }

    #[test]
    fn edges_are_normalized_and_numbered() {
        let graph = NoteGraph::from_parts(
            nodes(&["a", "b", "c"]),
            vec![pair("c", "b", 0.5), pair("b", "a", 0.6)],
            Coverage::default(),
        )
        .unwrap();

        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges[0].id, EdgeId(0));
        assert_eq!(edges[0].key(), (&"a".into(), &"b".into()));
        assert_eq!(edges[1].id, EdgeId(1));
        assert_eq!(edges[1].key(), (&"b".into(), &"c".into()));
        assert_eq!(graph.edge(EdgeId(1)).map(|e| e.weight), Some(0.5));
    }

    #[test]
    fn rejects_self_loops_and_duplicates() {
        let err = NoteGraph::from_parts(nodes(&["a"]), vec![pair("a", "a", 1.0)], Coverage::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidEdge { .. }));

        let err = NoteGraph::from_parts(
            nodes(&["a", "b"]),
            vec![pair("a", "b", 0.5), pair("b", "a", 0.5)],
            Coverage::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidEdge { .. }));
    }

    #[test]
    fn rejects_unknown_endpoints_and_bad_weights() {
        let err = NoteGraph::from_parts(nodes(&["a"]), vec![pair("a", "b", 0.5)], Coverage::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NodeNotFound { .. }));

        let err = NoteGraph::from_parts(
            nodes(&["a", "b"]),
            vec![pair("a", "b", 1.5)],
            Coverage::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidEdge { .. }));
    }

    #[test]
    fn rejects_duplicate_nodes() {
        let err = NoteGraph::from_parts(nodes(&["a", "a"]), vec![], Coverage::default()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateNode { .. }));
    }

    #[test]
    fn neighbors_use_adjacency() {
        let graph = NoteGraph::from_parts(
            nodes(&["a", "b", "c"]),
            vec![pair("a", "b", 0.5), pair("a", "c", 0.5)],
            Coverage::default(),
        )
        .unwrap();

        let a = NoteId::from("a");
        let mut around_a: Vec<_> = graph.neighbors(&a).cloned().collect();
        around_a.sort();
        assert_eq!(around_a, vec![NoteId::from("b"), NoteId::from("c")]);

        let missing = NoteId::from("zz");
        assert_eq!(graph.neighbors(&missing).count(), 0);
    }

    #[test]
    fn nodes_iterate_in_id_order() {
        let graph = NoteGraph::from_parts(nodes(&["c", "a", "b"]), vec![], Coverage::default()).unwrap();
        let ids: Vec<_> = graph.ids().map(NoteId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn apply_positions_copies_layout_state() {
        let mut graph = NoteGraph::from_parts(nodes(&["a", "b"]), vec![], Coverage::default()).unwrap();
        graph.apply_positions(|id| (id.as_str() == "a").then_some((Position::planar(1.0, 2.0), true)));

        let a = graph.node(&"a".into()).unwrap();
        assert_eq!(a.position, Position::planar(1.0, 2.0));
        assert!(a.pinned);
        assert!(!graph.node(&"b".into()).unwrap().pinned);
    }

    #[test]
    fn serde_roundtrip_revalidates() {
        let graph = NoteGraph::from_parts(
            nodes(&["a", "b"]),
            vec![pair("a", "b", 0.8)],
            Coverage {
                documents_total: 3,
                documents_embedded: 2,
            },
        )
        .unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let back: NoteGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.snapshot(), graph.snapshot());
        assert_eq!(back.stats().documents_total, 3);

        let mut tampered: serde_json::Value = serde_json::from_str(&json).unwrap();
        tampered["edges"][0]["target"] = serde_json::json!("a");
        assert!(serde_json::from_value::<NoteGraph>(tampered).is_err());
    }
}
