//! Property-based tests for graph construction.
//!
//! These hold for any document set and any valid parameters:
//! - edge weights lie in [min_similarity, 1]
//! - no self-loops, no duplicate pairs
//! - degree equals incident edge count
//! - node count never exceeds max_nodes
//! - no isolates remain when they are excluded
//! - repeated builds are identical

use std::collections::BTreeSet;

use proptest::prelude::*;

use notemap_core::{Document, GraphParams, NoteGraph, SimilarityGraphBuilder};

prop_compose! {
    /// Vectors drawn from a coarse grid so exact ties are common.
    fn arb_vector(dim: usize)(vec in prop::collection::vec((-2i8..=3).prop_map(f32::from), dim)) -> Vec<f32> {
        vec
    }
}

fn arb_documents() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec((0u8..40, arb_vector(4), any::<bool>()), 0..30).prop_map(|rows| {
        rows.into_iter()
            .map(|(id, vector, keep_vector)| {
                let vector = if keep_vector { vector } else { Vec::new() };
                Document::new(format!("n{id:02}"), vector)
            })
            .collect()
    })
}

fn arb_params() -> impl Strategy<Value = GraphParams> {
    (0.05f32..0.95, 1usize..5, 1usize..25, any::<bool>()).prop_map(
        |(min_similarity, top_k, max_nodes, include_isolates)| GraphParams {
            min_similarity,
            top_k,
            max_nodes,
            include_isolates,
            tag_filter: None,
        },
    )
}

fn build(docs: &[Document], params: &GraphParams) -> NoteGraph {
    SimilarityGraphBuilder::new(params.clone())
        .unwrap()
        .build(docs)
        .unwrap()
        .graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn edges_are_valid(docs in arb_documents(), params in arb_params()) {
        let graph = build(&docs, &params);
        let mut seen = BTreeSet::new();
        for edge in graph.edges() {
            prop_assert!(edge.source < edge.target, "unnormalised or self-loop edge");
            prop_assert!(edge.weight >= params.min_similarity && edge.weight <= 1.0,
                "weight {} outside [{}, 1]", edge.weight, params.min_similarity);
            prop_assert!(seen.insert((edge.source.clone(), edge.target.clone())), "duplicate edge");
        }
    }

    #[test]
    fn degrees_and_caps_hold(docs in arb_documents(), params in arb_params()) {
        let graph = build(&docs, &params);
        prop_assert!(graph.node_count() <= params.max_nodes);
        for node in graph.nodes() {
            prop_assert_eq!(node.degree, graph.incident_edges(&node.id).count());
            if !params.include_isolates {
                prop_assert!(node.degree > 0, "isolate {} survived", node.id);
            }
        }
        let stats = graph.stats();
        prop_assert_eq!(stats.node_count, graph.node_count());
        prop_assert_eq!(stats.edge_count, graph.edge_count());
        prop_assert!(stats.coverage >= 0.0 && stats.coverage <= 1.0);
    }

    #[test]
    fn builds_are_deterministic(docs in arb_documents(), params in arb_params()) {
        let first = build(&docs, &params);
        let second = build(&docs, &params);
        prop_assert_eq!(first.snapshot(), second.snapshot());

        // Input order does not matter either.
        let mut reversed = docs.clone();
        reversed.reverse();
        let third = build(&reversed, &params);
        let weights = |g: &NoteGraph| -> Vec<(String, String, u32)> {
            g.edges().map(|e| (e.source.to_string(), e.target.to_string(), e.weight.to_bits())).collect()
        };
        // Duplicate ids keep the first occurrence, so only compare duplicate-free inputs.
        let unique: BTreeSet<_> = docs.iter().map(|d| d.id.clone()).collect();
        if unique.len() == docs.len() {
            prop_assert_eq!(weights(&first), weights(&third));
        }
    }
}
