//! Layout output.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use notemap_core::{Dimensionality, LayoutStrategy, NoteId, Position};

/// Where one node ended up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    pub degree: usize,
    pub pinned: bool,
}

/// Positions for every node of one graph under one strategy, in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub strategy: LayoutStrategy,
    pub dimensionality: Dimensionality,
    pub positions: IndexMap<NoteId, Placement>,
    pub settled: bool,
    /// Relaxation iterations run (hold steps excluded).
    pub iterations: usize,
    /// Set when the jittered or spiral fallback had to fire.
    pub degenerate: bool,
}

impl LayoutResult {
    pub fn empty(strategy: LayoutStrategy, dimensionality: Dimensionality) -> Self {
        LayoutResult {
            strategy,
            dimensionality,
            positions: IndexMap::new(),
            settled: true,
            iterations: 0,
            degenerate: false,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, id: &NoteId) -> Option<&Placement> {
        self.positions.get(id)
    }

    pub fn position(&self, id: &NoteId) -> Option<Position> {
        self.positions.get(id).map(|p| p.position)
    }

    /// Positions keyed by id, for warm-starting the next run.
    pub fn position_map(&self) -> HashMap<NoteId, Position> {
        self.positions
            .iter()
            .map(|(id, p)| (id.clone(), p.position))
            .collect()
    }
}
