//! Events published to renderers and other observers.

use serde::Serialize;

use notemap_core::{DataQualityWarning, EdgeId, LayoutStrategy, NoteId};

use crate::highlight::HighlightSet;

/// Subscriber channel capacity; slow receivers see `Lagged` beyond this.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The focused node, its neighbours and incident edges changed.
    HighlightChanged {
        node: Option<NoteId>,
        neighbors: Vec<NoteId>,
        edges: Vec<EdgeId>,
    },
    /// A new layout was installed.
    LayoutSettled {
        generation: u64,
        strategy: LayoutStrategy,
        nodes: usize,
    },
    /// An in-flight refresh was cancelled and the previous state restored.
    RefreshCancelled { generation: u64 },
    /// The latest build excluded some documents.
    DataQualityWarnings { warnings: Vec<DataQualityWarning> },
}

impl SessionEvent {
    pub fn highlight(set: Option<&HighlightSet>) -> Self {
        match set {
            Some(set) => SessionEvent::HighlightChanged {
                node: Some(set.node.clone()),
                neighbors: set.neighbors.clone(),
                edges: set.edges.clone(),
            },
            None => SessionEvent::HighlightChanged {
                node: None,
                neighbors: Vec::new(),
                edges: Vec::new(),
            },
        }
    }
}
