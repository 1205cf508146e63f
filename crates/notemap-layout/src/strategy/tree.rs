//! Hierarchical tree placement.
//!
//! Roots are the top tenth of nodes by degree (at least one). A single
//! breadth-first sweep from all roots assigns depth levels; each node claims
//! its unvisited neighbours highest-degree first. Nodes the sweep never
//! reaches share one trailing level below the deepest discovered one.
//!
//! Levels run down the y axis at fixed spacing; nodes within a level are
//! spread symmetrically along x.

use std::collections::VecDeque;

use notemap_core::{Dimensionality, Position};

use crate::jitter::Jitter;
use crate::layout_graph::LayoutGraph;

pub const LEVEL_SPACING: f32 = 80.0;
pub const SIBLING_SPACING: f32 = 50.0;
pub const SIBLING_JITTER: f32 = 4.0;
pub const DEPTH_AXIS_JITTER: f32 = 20.0;

/// Depth assignment produced by the breadth-first sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeLevels {
    pub roots: Vec<usize>,
    pub depth: Vec<usize>,
    /// The node that claimed each node; `None` for roots and unreached nodes.
    pub parent: Vec<Option<usize>>,
    /// Node indices per level, in claim order.
    pub levels: Vec<Vec<usize>>,
    pub unreached: Vec<usize>,
}

impl TreeLevels {
    /// Deepest level reached by the sweep itself.
    pub fn max_discovered_depth(&self) -> usize {
        let trailing = usize::from(!self.unreached.is_empty());
        self.levels.len().saturating_sub(1 + trailing)
    }
}

pub fn assign_levels(graph: &LayoutGraph) -> TreeLevels {
    let n = graph.len();
    if n == 0 {
        return TreeLevels::default();
    }

    let ranking = graph.degree_ranking();
    let roots: Vec<usize> = ranking.iter().copied().take(n.div_ceil(10)).collect();

    let mut depth: Vec<Option<usize>> = vec![None; n];
    let mut parent = vec![None; n];
    let mut levels: Vec<Vec<usize>> = vec![Vec::new()];
    let mut queue = VecDeque::new();
    for &r in &roots {
        depth[r] = Some(0);
        levels[0].push(r);
        queue.push_back(r);
    }

    while let Some(u) = queue.pop_front() {
        let d = depth[u].unwrap_or(0) + 1;
        let mut children: Vec<usize> = graph
            .neighbors(u)
            .iter()
            .map(|&(v, _)| v)
            .filter(|&v| depth[v].is_none())
            .collect();
        children.sort_by(|&a, &b| graph.degree(b).cmp(&graph.degree(a)).then(a.cmp(&b)));
        for v in children {
            depth[v] = Some(d);
            parent[v] = Some(u);
            if levels.len() <= d {
                levels.push(Vec::new());
            }
            levels[d].push(v);
            queue.push_back(v);
        }
    }

    let trailing = levels.len();
    let unreached: Vec<usize> = ranking.into_iter().filter(|&i| depth[i].is_none()).collect();
    if !unreached.is_empty() {
        for &i in &unreached {
            depth[i] = Some(trailing);
        }
        levels.push(unreached.clone());
    }

    TreeLevels {
        roots,
        depth: depth.into_iter().map(|d| d.unwrap_or(trailing)).collect(),
        parent,
        levels,
        unreached,
    }
}

pub fn place(graph: &LayoutGraph, dims: Dimensionality, jitter: &mut Jitter) -> Vec<Position> {
    let levels = assign_levels(graph);
    let mut positions = vec![Position::ORIGIN; graph.len()];

    for (depth, level) in levels.levels.iter().enumerate() {
        let half_width = (level.len() as f32 - 1.0) / 2.0;
        for (k, &i) in level.iter().enumerate() {
            let x = (k as f32 - half_width) * SIBLING_SPACING + jitter.offset(SIBLING_JITTER);
            let y = -(depth as f32) * LEVEL_SPACING;
            let z = if dims.is_3d() {
                jitter.offset(DEPTH_AXIS_JITTER)
            } else {
                0.0
            };
            positions[i] = Position::new(x, y, z);
        }
    }
    positions
}
