//! SimilarityGraphBuilder: documents in, bounded neighbour graph out.
//!
//! # Pipeline
//!
//! 1. **Select**: apply the tag filter, sort by id, drop duplicate ids.
//! 2. **Screen**: keep documents whose vector is non-empty, finite, non-zero
//!    and of the reference dimension. Everything else becomes a
//!    [`DataQualityWarning`] and lowers coverage.
//! 3. **Score**: cosine similarity for every pair, clipped to `[0, 1]`.
//!    Each pair is visited once and offered to both endpoints.
//! 4. **Pick**: each node keeps a bounded buffer of up to `top_k`
//!    neighbours at or above `min_similarity`, ordered by similarity
//!    descending then id ascending. The undirected edge set is the union of
//!    all buffers; no full similarity matrix is ever held.
//! 5. **Prune**: drop isolates if asked, truncate to `max_nodes` by degree
//!    (id ascending on ties), drop edges to removed nodes, recompute degree.
//!
//! Every step iterates in id order, so identical input always yields an
//! identical edge set with identical weights.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::cancel::CancelToken;
use crate::config::GraphParams;
use crate::document::Document;
use crate::error::CoreError;
use crate::graph::{Coverage, NoteGraph};
use crate::node::Node;
use crate::quality::{reference_dimension, DataQualityWarning};
use crate::similarity::{cosine, Embedding};

/// Undirected edges between screened documents, keyed `(low, high)` by
/// position in the id-sorted document list.
type EdgeSet = BTreeMap<(usize, usize), f32>;

/// Result of a build: the graph plus the non-fatal diagnostics.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: NoteGraph,
    pub warnings: Vec<DataQualityWarning>,
}

/// Builds a [`NoteGraph`] from documents under a fixed set of parameters.
#[derive(Debug, Clone)]
pub struct SimilarityGraphBuilder {
    params: GraphParams,
}

impl SimilarityGraphBuilder {
    /// Validates the parameters; an invalid configuration never builds.
    pub fn new(params: GraphParams) -> Result<Self, CoreError> {
        params.validate()?;
        Ok(SimilarityGraphBuilder { params })
    }

    pub fn params(&self) -> &GraphParams {
        &self.params
    }

    pub fn build(&self, documents: &[Document]) -> Result<BuildOutput, CoreError> {
        self.build_with_cancel(documents, &CancelToken::new())
    }

    /// Like [`build`](Self::build), polling `cancel` once per similarity row
    /// and between passes.
    pub fn build_with_cancel(
        &self,
        documents: &[Document],
        cancel: &CancelToken,
    ) -> Result<BuildOutput, CoreError> {
        let mut warnings = Vec::new();

        let selected = select(documents, self.params.tags(), &mut warnings);
        let usable = screen(&selected, &mut warnings);
        let coverage = Coverage {
            documents_total: selected.len(),
            documents_embedded: usable.len(),
        };
        cancel.check()?;

        if !warnings.is_empty() {
            tracing::warn!(
                excluded = warnings.len(),
                coverage = coverage.ratio(),
                "documents excluded from similarity graph"
            );
        }

        let embeddings: Vec<Embedding<'_>> = usable.iter().map(|(_, e)| *e).collect();
        let picked = pick_neighbors(
            &embeddings,
            self.params.min_similarity,
            self.params.top_k,
            cancel,
        )?;
        let (keep, edges) = prune(
            usable.len(),
            picked,
            self.params.include_isolates,
            self.params.max_nodes,
        );
        cancel.check()?;

        let nodes = usable
            .iter()
            .zip(&keep)
            .filter(|(_, kept)| **kept)
            .map(|((doc, _), _)| Node::from_document(doc))
            .collect();
        let edges = edges
            .into_iter()
            .map(|((a, b), w)| (usable[a].0.id.clone(), usable[b].0.id.clone(), w))
            .collect();
        let graph = NoteGraph::from_parts(nodes, edges, coverage)?;

        tracing::debug!(
            documents = documents.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "similarity graph built"
        );
        Ok(BuildOutput { graph, warnings })
    }
}

/// Tag filter, id sort, first-occurrence dedup.
fn select<'a>(
    documents: &'a [Document],
    tags: Option<&[String]>,
    warnings: &mut Vec<DataQualityWarning>,
) -> Vec<&'a Document> {
    let mut selected: Vec<&Document> = documents.iter().filter(|d| d.matches_tags(tags)).collect();
    // Stable sort: among equal ids the earliest input wins.
    selected.sort_by(|a, b| a.id.cmp(&b.id));

    let mut out: Vec<&Document> = Vec::with_capacity(selected.len());
    for doc in selected {
        if out.last().is_some_and(|prev| prev.id == doc.id) {
            warnings.push(DataQualityWarning::DuplicateId { id: doc.id.clone() });
        } else {
            out.push(doc);
        }
    }
    out
}

/// Keeps documents with a usable vector of the reference dimension.
fn screen<'a>(
    selected: &[&'a Document],
    warnings: &mut Vec<DataQualityWarning>,
) -> Vec<(&'a Document, Embedding<'a>)> {
    let reference = reference_dimension(selected.iter().copied());
    let mut usable = Vec::with_capacity(selected.len());

    for &doc in selected {
        let id = doc.id.clone();
        if doc.vector.is_empty() {
            warnings.push(DataQualityWarning::MissingVector { id });
            continue;
        }
        if !doc.vector.iter().all(|x| x.is_finite()) {
            warnings.push(DataQualityWarning::NonFiniteVector { id });
            continue;
        }
        if let Some(expected) = reference {
            if doc.vector.len() != expected {
                warnings.push(DataQualityWarning::DimensionMismatch {
                    id,
                    expected,
                    actual: doc.vector.len(),
                });
                continue;
            }
        }
        let embedding = Embedding::new(&doc.vector);
        if embedding.norm_sq <= 0.0 {
            warnings.push(DataQualityWarning::ZeroVector { id });
            continue;
        }
        usable.push((doc, embedding));
    }
    usable
}

/// Best `k` neighbours of one node, similarity descending then index
/// ascending. Never holds more than `k` entries.
#[derive(Debug, Default, Clone)]
struct TopK {
    entries: SmallVec<[(usize, f32); 8]>,
}

impl TopK {
    fn offer(&mut self, k: usize, j: usize, s: f32) {
        // Index order is id order, so the secondary key is the id tie-break.
        let pos = self
            .entries
            .partition_point(|&(other, t)| t.total_cmp(&s).then(j.cmp(&other)).is_gt());
        if pos >= k {
            return;
        }
        self.entries.insert(pos, (j, s));
        self.entries.truncate(k);
    }
}

/// Per-node top-k selection, unioned into an undirected edge set.
///
/// Each pair is scored once and offered to both endpoints, so memory stays
/// proportional to `n * top_k`.
fn pick_neighbors(
    embeddings: &[Embedding<'_>],
    min_similarity: f32,
    top_k: usize,
    cancel: &CancelToken,
) -> Result<EdgeSet, CoreError> {
    let n = embeddings.len();
    let mut best = vec![TopK::default(); n];

    for i in 0..n {
        cancel.check()?;
        for j in (i + 1)..n {
            // Screening guarantees matching dims and non-zero norms.
            let s = cosine(embeddings[i], embeddings[j]).unwrap_or(0.0);
            if s >= min_similarity {
                best[i].offer(top_k, j, s);
                best[j].offer(top_k, i, s);
            }
        }
    }

    let mut edges = EdgeSet::new();
    for (i, picks) in best.iter().enumerate() {
        for &(j, s) in &picks.entries {
            edges.insert((i.min(j), i.max(j)), s);
        }
    }
    Ok(edges)
}

fn degrees(n: usize, keep: &[bool], edges: &EdgeSet) -> Vec<usize> {
    let mut degree = vec![0usize; n];
    for &(a, b) in edges.keys() {
        if keep[a] && keep[b] {
            degree[a] += 1;
            degree[b] += 1;
        }
    }
    degree
}

/// Isolate removal and degree-ranked truncation.
///
/// Returns the keep mask and the surviving edges. When isolates are not
/// wanted, nodes that truncation leaves at degree 0 are removed as well.
fn prune(
    n: usize,
    mut edges: EdgeSet,
    include_isolates: bool,
    max_nodes: usize,
) -> (Vec<bool>, EdgeSet) {
    let all = vec![true; n];
    let degree = degrees(n, &all, &edges);
    let mut keep: Vec<bool> = degree.iter().map(|&d| include_isolates || d > 0).collect();

    let kept = keep.iter().filter(|&&k| k).count();
    if kept > max_nodes {
        let mut ranked: Vec<usize> = (0..n).filter(|&i| keep[i]).collect();
        ranked.sort_by(|&a, &b| degree[b].cmp(&degree[a]).then(a.cmp(&b)));

        keep = vec![false; n];
        for &i in ranked.iter().take(max_nodes) {
            keep[i] = true;
        }
        edges.retain(|&(a, b), _| keep[a] && keep[b]);

        if !include_isolates {
            let degree = degrees(n, &keep, &edges);
            for i in 0..n {
                if keep[i] && degree[i] == 0 {
                    keep[i] = false;
                }
            }
        }
        tracing::debug!(kept = max_nodes, dropped = kept - max_nodes, "truncated graph by degree");
    }

    edges.retain(|&(a, b), _| keep[a] && keep[b]);
    (keep, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_set(pairs: &[(usize, usize)]) -> EdgeSet {
        pairs.iter().map(|&(a, b)| ((a.min(b), a.max(b)), 0.9)).collect()
    }

    /// Hub 0 (degree 5), 1 (degree 4), 2 (degree 3), 3 (degree 2), 4 (degree 1)
    /// with leaves 5..=7 padding the degrees.
    fn ranked_fixture() -> EdgeSet {
        edge_set(&[
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (0, 5),
            (1, 2),
            (1, 3),
            (1, 6),
            (2, 7),
        ])
    }

    #[test]
    fn fixture_degrees() {
        let edges = ranked_fixture();
        let degree = degrees(8, &[true; 8], &edges);
        assert_eq!(&degree[..5], &[5, 4, 3, 2, 1]);
    }

    #[test]
    fn truncation_keeps_highest_degree_and_recomputes() {
        let (keep, edges) = prune(8, ranked_fixture(), true, 2);
        let kept: Vec<usize> = (0..8).filter(|&i| keep[i]).collect();
        assert_eq!(kept, vec![0, 1]);
        assert_eq!(edges.keys().copied().collect::<Vec<_>>(), vec![(0, 1)]);
        assert_eq!(degrees(8, &keep, &edges)[0], 1);
    }

    #[test]
    fn truncation_tie_breaks_by_index() {
        // Three disjoint edges: every node has degree 1.
        let edges = edge_set(&[(0, 5), (1, 4), (2, 3)]);
        let (keep, edges) = prune(6, edges, true, 3);
        assert_eq!(keep, vec![true, true, true, false, false, false]);
        assert!(edges.is_empty());
    }

    #[test]
    fn truncation_without_isolates_drops_new_isolates() {
        let edges = edge_set(&[(0, 5), (1, 4), (2, 3)]);
        let (keep, edges) = prune(6, edges, false, 3);
        assert!(keep.iter().all(|&k| !k));
        assert!(edges.is_empty());
    }

    #[test]
    fn isolates_dropped_on_request() {
        let edges = edge_set(&[(0, 1)]);
        let (keep, _) = prune(3, edges.clone(), false, 10);
        assert_eq!(keep, vec![true, true, false]);
        let (keep, _) = prune(3, edges, true, 10);
        assert_eq!(keep, vec![true, true, true]);
    }

    #[test]
    fn top_k_buffer_is_bounded_and_breaks_ties_by_index() {
        let mut picks = TopK::default();
        for (j, s) in [(7, 0.5), (3, 0.9), (5, 0.9), (1, 0.9), (2, 0.95), (9, 0.1)] {
            picks.offer(3, j, s);
            assert!(picks.entries.len() <= 3);
        }
        assert_eq!(picks.entries.as_slice(), &[(2, 0.95), (1, 0.9), (3, 0.9)]);
    }

    #[test]
    fn pairwise_picks_match_exhaustive_ranking() {
        let vectors: Vec<[f32; 3]> = vec![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.9, 0.1, 0.0],
            [0.5, 0.5, 0.0],
            [0.0, 1.0, 0.1],
            [0.0, 0.2, 1.0],
            [0.3, 0.3, 0.3],
        ];
        let embeddings: Vec<Embedding<'_>> = vectors.iter().map(|v| Embedding::new(v)).collect();
        let (min_similarity, top_k) = (0.2, 2);
        let picked = pick_neighbors(&embeddings, min_similarity, top_k, &CancelToken::new()).unwrap();

        let n = embeddings.len();
        let mut expected = EdgeSet::new();
        for i in 0..n {
            let mut row: Vec<(usize, f32)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, cosine(embeddings[i], embeddings[j]).unwrap_or(0.0)))
                .filter(|&(_, s)| s >= min_similarity)
                .collect();
            row.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            for &(j, s) in row.iter().take(top_k) {
                expected.insert((i.min(j), i.max(j)), s);
            }
        }
        assert_eq!(picked, expected);
    }

    #[test]
    fn invalid_params_never_build() {
        let params = GraphParams {
            top_k: 0,
            ..GraphParams::default()
        };
        assert!(SimilarityGraphBuilder::new(params).is_err());
    }

    #[test]
    fn cancelled_token_aborts() {
        let builder = SimilarityGraphBuilder::new(GraphParams::default()).unwrap();
        let docs = vec![Document::new("a", vec![1.0]), Document::new("b", vec![1.0])];
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            builder.build_with_cancel(&docs, &token),
            Err(CoreError::Cancelled)
        ));
    }

    #[test]
    fn non_finite_vectors_do_not_set_the_reference_dimension() {
        let docs = vec![
            Document::new("a", vec![1.0, 0.0]),
            Document::new("b", vec![0.9, 0.1]),
            Document::new("x", vec![f32::NAN, 0.0, 0.0]),
            Document::new("y", vec![0.0, f32::INFINITY, 0.0]),
            Document::new("z", vec![0.0, 0.0, f32::NAN]),
        ];
        let builder = SimilarityGraphBuilder::new(GraphParams::default()).unwrap();
        let out = builder.build(&docs).unwrap();

        assert_eq!(out.graph.node_count(), 2);
        assert_eq!(out.graph.edge_count(), 1);
        assert_eq!(out.warnings.len(), 3);
        assert!(out
            .warnings
            .iter()
            .all(|w| matches!(w, DataQualityWarning::NonFiniteVector { .. })));
    }

    #[test]
    fn screening_reports_each_problem() {
        let docs = vec![
            Document::new("a", vec![1.0, 0.0]),
            Document::new("b", vec![0.5, 0.5]),
            Document::new("c", vec![]),
            Document::new("d", vec![1.0, 0.0, 0.0]),
            Document::new("e", vec![f32::NAN, 1.0]),
            Document::new("f", vec![0.0, 0.0]),
            Document::new("a", vec![0.0, 1.0]),
        ];
        let builder = SimilarityGraphBuilder::new(GraphParams::default()).unwrap();
        let out = builder.build(&docs).unwrap();

        let kinds: Vec<String> = out.warnings.iter().map(|w| w.to_string()).collect();
        assert_eq!(out.warnings.len(), 5, "{kinds:?}");
        assert_eq!(out.graph.stats().documents_total, 6);
        assert_eq!(out.graph.stats().documents_embedded, 2);
        assert!((out.graph.stats().coverage - 2.0 / 6.0).abs() < 1e-6);
        assert_eq!(out.graph.node_count(), 2);
        // The first "a" (pointing along x) is the one kept.
        let weight = out.graph.edges().next().map(|e| e.weight).unwrap();
        assert!((weight - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }
}
