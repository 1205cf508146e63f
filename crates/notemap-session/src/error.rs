//! Session error types.
//!
//! Superseded and cancelled refreshes are not errors; they resolve as
//! [`RefreshOutcome`](crate::state::RefreshOutcome) variants. Everything here
//! is a real failure the caller has to act on.

use notemap_core::{CoreError, NoteId, SourceError};
use notemap_layout::LayoutError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid configuration; the action is rejected and nothing changes.
    #[error("invalid input: {0}")]
    Input(CoreError),

    /// The embedding source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The layout engine failed for a reason other than cancellation.
    #[error(transparent)]
    Layout(LayoutError),

    /// The id is not part of the current (or pending) graph.
    #[error("unknown node: {id}")]
    UnknownNode { id: NoteId },

    /// A background computation panicked or was aborted.
    #[error("background task failed: {reason}")]
    TaskFailed { reason: String },
}

impl SessionError {
    pub fn is_input_error(&self) -> bool {
        matches!(self, SessionError::Input(_) | SessionError::UnknownNode { .. })
    }
}

impl From<CoreError> for SessionError {
    fn from(err: CoreError) -> Self {
        if err.is_input_error() {
            SessionError::Input(err)
        } else {
            SessionError::TaskFailed {
                reason: err.to_string(),
            }
        }
    }
}

impl From<LayoutError> for SessionError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::Core(core) if core.is_input_error() => SessionError::Input(core),
            other => SessionError::Layout(other),
        }
    }
}

impl From<tokio::task::JoinError> for SessionError {
    fn from(err: tokio::task::JoinError) -> Self {
        SessionError::TaskFailed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_split_by_kind() {
        let input = SessionError::from(CoreError::UnknownStrategy { name: "grid".into() });
        assert!(input.is_input_error());
        let internal = SessionError::from(CoreError::InvalidEdge { reason: "x".into() });
        assert!(matches!(internal, SessionError::TaskFailed { .. }));
    }

    #[test]
    fn layout_input_errors_become_input() {
        let err = SessionError::from(LayoutError::Core(CoreError::UnsupportedDimensionality { value: 5 }));
        assert!(matches!(err, SessionError::Input(_)));
        assert!(err.to_string().contains("dimensionality"));
    }
}
