//! Graph node: one note, its display metadata and layout state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::id::NoteId;
use crate::position::Position;

/// A note in the similarity graph.
///
/// `degree` is derived from the graph's edges and is kept in sync by
/// [`NoteGraph`](crate::graph::NoteGraph); callers never set it directly.
/// `position` and `pinned` are layout state copied in from the most recent
/// layout run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub content_length: usize,
    #[serde(default)]
    pub degree: usize,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub pinned: bool,
}

impl Node {
    pub fn new(id: impl Into<NoteId>) -> Self {
        Node {
            id: id.into(),
            title: String::new(),
            preview: String::new(),
            tags: BTreeSet::new(),
            content_length: 0,
            degree: 0,
            position: Position::ORIGIN,
            pinned: false,
        }
    }

    /// Builds a node from a document's display metadata.
    pub fn from_document(doc: &Document) -> Self {
        Node {
            id: doc.id.clone(),
            title: doc.title.clone(),
            preview: doc.preview.clone(),
            tags: doc.tags.iter().cloned().collect(),
            content_length: doc.content_length,
            degree: 0,
            position: Position::ORIGIN,
            pinned: false,
        }
    }

    /// Title for display, falling back to the id for untitled notes.
    pub fn label(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Note {}", self.id)
        } else {
            self.title.clone()
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.degree == 0
    }
}
