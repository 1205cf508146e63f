//! Initial placement for each layout strategy.
//!
//! Every strategy maps a [`LayoutGraph`] to one position per node. Structured
//! strategies also name nodes that stay anchored through the smoothing pass
//! (the radial centre).

pub mod force;
pub mod radial;
pub mod spiral;
pub mod tree;

use std::collections::HashMap;

use notemap_core::{Dimensionality, LayoutStrategy, NoteId, Position};

use crate::jitter::Jitter;
use crate::layout_graph::LayoutGraph;

/// Starting state handed to the simulation.
#[derive(Debug, Clone, Default)]
pub struct InitialPlacement {
    pub positions: Vec<Position>,
    pub anchored: Vec<bool>,
}

pub fn initial_placement(
    strategy: LayoutStrategy,
    graph: &LayoutGraph,
    dims: Dimensionality,
    previous: &HashMap<NoteId, Position>,
    jitter: &mut Jitter,
) -> InitialPlacement {
    let mut anchored = vec![false; graph.len()];
    let positions = match strategy {
        LayoutStrategy::Force => force::initial_positions(graph, dims, previous, jitter),
        LayoutStrategy::Tree => tree::place(graph, dims, jitter),
        LayoutStrategy::Radial => {
            let placement = radial::place(graph, dims, jitter);
            if let Some(center) = placement.center {
                anchored[center] = true;
            }
            placement.positions
        }
        LayoutStrategy::Spiral => spiral::place(graph, dims),
    };
    InitialPlacement { positions, anchored }
}
