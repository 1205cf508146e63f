//! EmbeddingSource: where documents and their vectors come from.
//!
//! Retrieval happens before the builder runs. Implementations may block
//! (file or database reads); the session calls them on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::document::Document;
use crate::error::SourceError;

/// Supplies documents with precomputed embeddings.
///
/// Documents without a vector are returned with an empty `vector`; the
/// builder excludes them and lowers coverage.
pub trait EmbeddingSource: Send + Sync {
    /// Lists documents, keeping only those sharing a tag with `tag_filter`
    /// when it is present and non-empty.
    fn list_documents(&self, tag_filter: Option<&[String]>) -> Result<Vec<Document>, SourceError>;
}

/// An in-memory document set that can be replaced between refreshes.
#[derive(Debug, Default)]
pub struct InMemorySource {
    documents: RwLock<Vec<Document>>,
}

impl InMemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        InMemorySource {
            documents: RwLock::new(documents),
        }
    }

    /// Replaces the document set.
    pub fn replace(&self, documents: Vec<Document>) -> Result<(), SourceError> {
        let mut guard = self.documents.write().map_err(|_| SourceError::Unavailable {
            reason: "document store lock poisoned".into(),
        })?;
        *guard = documents;
        Ok(())
    }
}

impl EmbeddingSource for InMemorySource {
    fn list_documents(&self, tag_filter: Option<&[String]>) -> Result<Vec<Document>, SourceError> {
        let guard = self.documents.read().map_err(|_| SourceError::Unavailable {
            reason: "document store lock poisoned".into(),
        })?;
        Ok(guard.iter().filter(|d| d.matches_tags(tag_filter)).cloned().collect())
    }
}

/// Reads a JSON array of documents from disk on every call.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EmbeddingSource for JsonFileSource {
    fn list_documents(&self, tag_filter: Option<&[String]>) -> Result<Vec<Document>, SourceError> {
        let text = std::fs::read_to_string(&self.path)?;
        let documents: Vec<Document> = serde_json::from_str(&text)?;
        tracing::debug!(path = %self.path.display(), count = documents.len(), "loaded documents");
        Ok(documents
            .into_iter()
            .filter(|d| d.matches_tags(tag_filter))
            .collect())
    }
}
