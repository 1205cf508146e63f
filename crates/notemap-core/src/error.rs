//! Core error types for notemap-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Configuration
//! problems are rejected before any work starts; cancellation is reported as
//! its own variant so callers can treat it as "superseded" rather than failed.

use thiserror::Error;

use crate::id::NoteId;

/// Core errors produced by graph construction and configuration checks.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configuration field is outside its allowed range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A layout strategy name did not match any known strategy.
    #[error("unknown layout strategy: '{name}' (expected force, tree, radial or spiral)")]
    UnknownStrategy { name: String },

    /// Only 2-D and 3-D layouts are supported.
    #[error("unsupported dimensionality: {value} (expected 2 or 3)")]
    UnsupportedDimensionality { value: u8 },

    /// A node id was not found in the graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: NoteId },

    /// Two nodes with the same id were handed to the graph constructor.
    #[error("duplicate node: {id}")]
    DuplicateNode { id: NoteId },

    /// An edge failed validation (self-loop, duplicate pair, bad weight).
    #[error("invalid edge: {reason}")]
    InvalidEdge { reason: String },

    /// The computation was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("computation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Returns `true` for errors caused by caller-supplied configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidConfig { .. }
                | CoreError::UnknownStrategy { .. }
                | CoreError::UnsupportedDimensionality { .. }
        )
    }
}

/// Errors produced by an [`EmbeddingSource`](crate::source::EmbeddingSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading the backing file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The document payload could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The source could not serve documents right now.
    #[error("source unavailable: {reason}")]
    Unavailable { reason: String },
}
