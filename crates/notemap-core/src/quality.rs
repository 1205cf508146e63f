//! Data-quality diagnostics raised while building a graph.
//!
//! These are never fatal. An affected document is left out of the graph,
//! counted against the coverage statistic, and reported so the caller can
//! surface a dismissible warning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::id::NoteId;

/// A non-fatal problem with one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// The source supplied no embedding.
    #[error("note {id} has no embedding")]
    MissingVector { id: NoteId },

    /// The embedding length differs from the collection's reference dimension.
    #[error("note {id} embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        id: NoteId,
        expected: usize,
        actual: usize,
    },

    /// The embedding contains NaN or infinite components.
    #[error("note {id} embedding contains non-finite values")]
    NonFiniteVector { id: NoteId },

    /// The embedding is all zeros, so it has no direction.
    #[error("note {id} embedding has zero norm")]
    ZeroVector { id: NoteId },

    /// Another document already used this id.
    #[error("duplicate note id {id}; later copy ignored")]
    DuplicateId { id: NoteId },
}

impl DataQualityWarning {
    pub fn note_id(&self) -> &NoteId {
        match self {
            DataQualityWarning::MissingVector { id }
            | DataQualityWarning::DimensionMismatch { id, .. }
            | DataQualityWarning::NonFiniteVector { id }
            | DataQualityWarning::ZeroVector { id }
            | DataQualityWarning::DuplicateId { id } => id,
        }
    }
}

/// The most common length among non-empty, all-finite vectors. Ties go to
/// the smaller length.
pub fn reference_dimension<'a, I>(docs: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    // Only vectors that can pass screening vote.
    for doc in docs
        .into_iter()
        .filter(|d| !d.vector.is_empty() && d.vector.iter().all(|x| x.is_finite()))
    {
        *counts.entry(doc.vector.len()).or_default() += 1;
    }
    // BTreeMap iterates ascending, and max_by_key keeps the last maximum,
    // so walk it in reverse to prefer the smaller dimension on ties.
    counts
        .into_iter()
        .rev()
        .max_by_key(|&(_, count)| count)
        .map(|(dim, _)| dim)
}
