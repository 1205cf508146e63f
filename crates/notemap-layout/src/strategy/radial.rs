//! Concentric radial placement.
//!
//! The highest-degree node sits at the origin. The rest are bucketed by
//! degree value into at most five rings, higher degrees innermost; nodes of
//! equal degree always share a ring. When there are more distinct degrees
//! than rings, adjacent degree values are merged. A ring is widened when its
//! default radius would leave neighbours on it closer than the minimum arc
//! distance.

use std::f32::consts::TAU;

use notemap_core::{Dimensionality, Position};

use crate::jitter::Jitter;
use crate::layout_graph::LayoutGraph;

pub const MAX_RINGS: usize = 5;
pub const RING_SPACING: f32 = 120.0;
pub const MIN_ARC: f32 = 45.0;
pub const RADIUS_JITTER: f32 = 0.03;
pub const ANGLE_JITTER: f32 = 0.02;
pub const RING_Z_OFFSET: f32 = 40.0;

/// Radial placement plus the index of the anchored centre node.
#[derive(Debug, Clone, Default)]
pub struct RadialPlacement {
    pub positions: Vec<Position>,
    pub center: Option<usize>,
    /// Ring index (0 = innermost) for every non-centre node.
    pub ring: Vec<Option<usize>>,
}

/// Radius of ring `ring` holding `count` nodes, never inside `inner`.
pub fn ring_radius(ring: usize, count: usize, inner: f32) -> f32 {
    let base = RING_SPACING * (ring + 1) as f32;
    let required = count as f32 * MIN_ARC / TAU;
    base.max(required).max(inner + RING_SPACING * 0.5)
}

pub fn place(graph: &LayoutGraph, dims: Dimensionality, jitter: &mut Jitter) -> RadialPlacement {
    let n = graph.len();
    let mut positions = vec![Position::ORIGIN; n];
    let mut ring_of = vec![None; n];
    let ranking = graph.degree_ranking();
    let Some((&center, rest)) = ranking.split_first() else {
        return RadialPlacement::default();
    };

    // `rest` is sorted by degree descending, so distinct values come out
    // in ring order.
    let mut distinct: Vec<usize> = rest.iter().map(|&i| graph.degree(i)).collect();
    distinct.dedup();
    let rings = distinct.len().min(MAX_RINGS);
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); rings];
    for &i in rest {
        let level = distinct
            .iter()
            .position(|&d| d == graph.degree(i))
            .unwrap_or(distinct.len() - 1);
        let ring = level * rings / distinct.len();
        buckets[ring].push(i);
        ring_of[i] = Some(ring);
    }

    let mut inner = 0.0f32;
    for (ring, members) in buckets.iter().enumerate() {
        let radius = ring_radius(ring, members.len(), inner);
        inner = radius;
        let count = members.len() as f32;
        // Stagger rings so spokes do not line up.
        let phase = ring as f32 * 0.5;
        let z = if dims.is_3d() {
            let sign = if ring % 2 == 0 { 1.0 } else { -1.0 };
            sign * RING_Z_OFFSET * (ring + 1) as f32
        } else {
            0.0
        };
        for (k, &i) in members.iter().enumerate() {
            let r = radius * (1.0 + jitter.offset(RADIUS_JITTER));
            let angle = phase + TAU * k as f32 / count + jitter.offset(ANGLE_JITTER);
            positions[i] = Position::new(r * angle.cos(), r * angle.sin(), z);
        }
    }

    RadialPlacement {
        positions,
        center: Some(center),
        ring: ring_of,
    }
}
