//! Session state machine types.
//!
//! ```text
//! Empty ──refresh──▶ Building ──built──▶ LayingOut ──laid out──▶ Settled
//!   ▲                   │                    │  ▲                   │
//!   └──── cancel ───────┴──── cancel ────────┘  └─ change_strategy ─┘
//! ```
//!
//! Cancelling returns to the last settled state (or `Empty` before the first
//! layout). A newer request bumps the generation; a computation whose
//! generation is no longer current is discarded, never merged.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notemap_core::{CancelToken, DataQualityWarning, MapConfig, NoteGraph};
use notemap_layout::LayoutResult;

use crate::highlight::{Focus, HighlightSet};

/// Unique session identifier (UUID v4 newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Building,
    LayingOut,
    Settled,
}

/// How a refresh or re-layout request resolved. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// This request's result is now installed.
    Settled,
    /// A newer request won; this result was discarded.
    Superseded,
    /// `cancel()` aborted this request.
    Cancelled,
    /// Recorded for the in-flight (or next) refresh to apply.
    Deferred,
}

/// A built graph waiting for its layout.
#[derive(Debug, Clone)]
pub(crate) struct PendingBuild {
    pub graph: Arc<NoteGraph>,
    /// `None` for pure re-layouts, which do not replace the warnings.
    pub warnings: Option<Vec<DataQualityWarning>>,
}

/// Everything behind the session lock.
#[derive(Debug)]
pub(crate) struct SessionInner {
    pub state: SessionState,
    pub generation: u64,
    pub config: MapConfig,
    pub graph: Arc<NoteGraph>,
    pub layout: Option<LayoutResult>,
    pub pending: Option<PendingBuild>,
    /// Token of the in-flight computation, if any.
    pub cancel: Option<CancelToken>,
    pub focus: Focus,
    pub highlight: Option<HighlightSet>,
    pub warnings: Vec<DataQualityWarning>,
}

impl SessionInner {
    pub fn new(config: MapConfig) -> Self {
        SessionInner {
            state: SessionState::Empty,
            generation: 0,
            config,
            graph: Arc::new(NoteGraph::empty()),
            layout: None,
            pending: None,
            cancel: None,
            focus: Focus::default(),
            highlight: None,
            warnings: Vec::new(),
        }
    }

    /// State to fall back to when in-flight work is abandoned.
    pub fn resting_state(&self) -> SessionState {
        if self.layout.is_some() {
            SessionState::Settled
        } else {
            SessionState::Empty
        }
    }

    /// Starts a new generation, cancelling whatever was in flight.
    pub fn begin(&mut self) -> (u64, CancelToken) {
        if let Some(previous) = self.cancel.take() {
            previous.cancel();
            tracing::info!(superseded = self.generation, "superseding in-flight computation");
        }
        self.generation += 1;
        let token = CancelToken::new();
        self.cancel = Some(token.clone());
        (self.generation, token)
    }

    /// Whether a computation started as `generation` with `token` may still
    /// write its result.
    pub fn is_current(&self, generation: u64, token: &CancelToken) -> bool {
        self.generation == generation && !token.is_cancelled()
    }

    /// Outcome for a computation that lost the right to install.
    pub fn stale_outcome(&self, generation: u64) -> RefreshOutcome {
        if self.generation == generation {
            RefreshOutcome::Cancelled
        } else {
            RefreshOutcome::Superseded
        }
    }

    /// Abandons in-flight work after a failure of the current generation.
    pub fn abandon(&mut self, generation: u64) {
        if self.generation == generation {
            self.cancel = None;
            self.pending = None;
            self.state = self.resting_state();
        }
    }

    /// Recomputes the highlight for the current focus. Returns the new set
    /// when it differs from the old one.
    pub fn recompute_highlight(&mut self) -> Option<Option<HighlightSet>> {
        let graph = Arc::clone(&self.graph);
        self.focus.retain(|id| graph.contains(id));
        let next = self
            .focus
            .effective()
            .and_then(|id| HighlightSet::compute(&graph, id));
        if next == self.highlight {
            None
        } else {
            self.highlight = next.clone();
            Some(next)
        }
    }
}
