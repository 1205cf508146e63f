//! Rank-ordered golden-angle spiral.
//!
//! Nodes sorted by degree (descending, id ascending) are placed at
//! `radius = sqrt(rank + 1) * scale`, `angle = rank * golden_angle`. The
//! spiral also serves as the deterministic fallback when a run produces
//! non-finite coordinates.

use notemap_core::{Dimensionality, Position};

use crate::layout_graph::LayoutGraph;

/// `π(3 − √5)`, about 2.399963 rad.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;
pub const SCALE: f32 = 30.0;
pub const DEPTH_PER_RANK: f32 = 4.0;

pub fn spiral_point(rank: usize, dims: Dimensionality) -> Position {
    let radius = ((rank + 1) as f32).sqrt() * SCALE;
    let angle = rank as f32 * GOLDEN_ANGLE;
    let z = if dims.is_3d() {
        rank as f32 * DEPTH_PER_RANK
    } else {
        0.0
    };
    Position::new(radius * angle.cos(), radius * angle.sin(), z)
}

pub fn place(graph: &LayoutGraph, dims: Dimensionality) -> Vec<Position> {
    let mut positions = vec![Position::ORIGIN; graph.len()];
    for (rank, i) in graph.degree_ranking().into_iter().enumerate() {
        positions[i] = spiral_point(rank, dims);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_angle_value() {
        let exact = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        assert!((f64::from(GOLDEN_ANGLE) - exact).abs() < 1e-6);
    }

    #[test]
    fn radius_grows_with_rank() {
        let first = spiral_point(0, Dimensionality::Two);
        let tenth = spiral_point(9, Dimensionality::Two);
        assert!((first.length() - SCALE).abs() < 1e-4);
        assert!((tenth.length() - 10f32.sqrt() * SCALE).abs() < 1e-3);
        assert_eq!(spiral_point(5, Dimensionality::Three).z, 20.0);
    }

    #[test]
    fn points_are_distinct() {
        let mut bits: Vec<[u32; 3]> = (0..500)
            .map(|r| spiral_point(r, Dimensionality::Two).to_bits())
            .collect();
        bits.sort();
        bits.dedup();
        assert_eq!(bits.len(), 500);
    }
}
