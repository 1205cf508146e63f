//! Force-directed relaxation.
//!
//! One call to [`relax`] is one iteration: all-pairs inverse-square
//! repulsion, spring attraction along edges, velocity damping, and a
//! displacement cap proportional to the current temperature. The caller owns
//! the temperature schedule and decides when to stop.
//!
//! [`RelaxMode::CollisionOnly`] is the smoothing pass used after a structured
//! placement is released: only nodes closer than `collision_distance` push
//! each other apart, and edges exert no pull, so the strategy's shape
//! survives while overlaps are resolved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use notemap_core::{CoreError, Dimensionality, NoteId, Position};

use crate::jitter::Jitter;
use crate::layout_graph::LayoutGraph;

/// Tunables for the relaxation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    pub repulsion: f32,
    pub spring: f32,
    /// Rest length is `rest_base + weight * rest_variable`.
    pub rest_base: f32,
    pub rest_variable: f32,
    pub damping: f32,
    pub initial_temperature: f32,
    pub cooling: f32,
    /// The run settles once the temperature drops below this.
    pub stop_threshold: f32,
    /// Per-iteration displacement cap at temperature 1.
    pub max_displacement: f32,
    pub max_iterations_2d: usize,
    pub max_iterations_3d: usize,
    pub collision_distance: f32,
    pub collision_strength: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        ForceParams {
            repulsion: 900.0,
            spring: 0.06,
            rest_base: 40.0,
            rest_variable: 60.0,
            damping: 0.85,
            initial_temperature: 1.0,
            cooling: 0.97,
            stop_threshold: 0.01,
            max_displacement: 25.0,
            max_iterations_2d: 250,
            max_iterations_3d: 350,
            collision_distance: 30.0,
            collision_strength: 0.5,
        }
    }
}

impl ForceParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        let positive = [
            ("repulsion", self.repulsion),
            ("max_displacement", self.max_displacement),
            ("initial_temperature", self.initial_temperature),
            ("stop_threshold", self.stop_threshold),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InvalidConfig {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        let unit = [("damping", self.damping), ("cooling", self.cooling)];
        for (field, value) in unit {
            if !(value > 0.0 && value < 1.0) {
                return Err(CoreError::InvalidConfig {
                    field,
                    reason: format!("must be within (0, 1), got {value}"),
                });
            }
        }
        if self.max_iterations_2d == 0 || self.max_iterations_3d == 0 {
            return Err(CoreError::InvalidConfig {
                field: "max_iterations",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn max_iterations(&self, dims: Dimensionality) -> usize {
        if dims.is_3d() {
            self.max_iterations_3d
        } else {
            self.max_iterations_2d
        }
    }

    pub fn rest_length(&self, weight: f32) -> f32 {
        self.rest_base + weight.clamp(0.0, 1.0) * self.rest_variable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxMode {
    Full,
    CollisionOnly,
}

/// Starting positions for a force run.
///
/// Ids present in `previous` resume where they were. A new id starts next to
/// its first already-placed neighbour, or failing that on a jittered
/// golden-angle disc ordered by degree.
pub fn initial_positions(
    graph: &LayoutGraph,
    dims: Dimensionality,
    previous: &HashMap<NoteId, Position>,
    jitter: &mut Jitter,
) -> Vec<Position> {
    let mut positions: Vec<Option<Position>> = graph
        .ids()
        .iter()
        .map(|id| previous.get(id).copied().filter(|p| p.is_finite()).map(|p| flatten(p, dims)))
        .collect();

    let mut disc_rank = 0usize;
    for i in graph.degree_ranking() {
        if positions[i].is_some() {
            continue;
        }
        let anchor = graph.neighbors(i).iter().find_map(|&(j, _)| positions[j]);
        let p = match anchor {
            Some(near) => jitter.nudge(near, 10.0, dims),
            None => {
                let r = 25.0 * ((disc_rank + 1) as f32).sqrt() + jitter.offset(5.0);
                let angle = disc_rank as f32 * crate::strategy::spiral::GOLDEN_ANGLE + jitter.offset(0.1);
                disc_rank += 1;
                let z = if dims.is_3d() { jitter.offset(r * 0.5) } else { 0.0 };
                Position::new(r * angle.cos(), r * angle.sin(), z)
            }
        };
        positions[i] = Some(p);
    }

    positions.into_iter().map(|p| p.unwrap_or(Position::ORIGIN)).collect()
}

fn flatten(p: Position, dims: Dimensionality) -> Position {
    if dims.is_3d() {
        p
    } else {
        Position::planar(p.x, p.y)
    }
}

/// Runs one relaxation iteration in place and returns the largest
/// displacement applied. Nodes with `frozen[i]` set neither move nor keep
/// velocity, but still push and pull the others.
#[allow(clippy::too_many_arguments)]
pub fn relax(
    graph: &LayoutGraph,
    params: &ForceParams,
    mode: RelaxMode,
    temperature: f32,
    dims: Dimensionality,
    frozen: &[bool],
    positions: &mut [Position],
    velocities: &mut [Position],
    jitter: &mut Jitter,
) -> f32 {
    let n = positions.len();
    let mut forces = vec![Position::ORIGIN; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let mut delta = positions[i] - positions[j];
            let mut dist_sq = delta.length_squared();
            if dist_sq < 1e-6 {
                // Coincident: pick a direction rather than divide by zero.
                delta = jitter.direction(dims) * 0.1;
                dist_sq = delta.length_squared();
            }
            let dist = dist_sq.sqrt();
            let magnitude = match mode {
                RelaxMode::Full => params.repulsion / dist_sq.max(0.01),
                RelaxMode::CollisionOnly if dist < params.collision_distance => {
                    (params.collision_distance - dist) * params.collision_strength
                }
                RelaxMode::CollisionOnly => continue,
            };
            let push = delta * (magnitude / dist);
            forces[i] += push;
            forces[j] -= push;
        }
    }

    if mode == RelaxMode::Full {
        for &(a, b, weight) in graph.edges() {
            let delta = positions[b] - positions[a];
            let dist = delta.length();
            if dist < 1e-6 {
                continue;
            }
            let pull = delta * (params.spring * (dist - params.rest_length(weight)) / dist);
            forces[a] += pull;
            forces[b] -= pull;
        }
    }

    let cap = params.max_displacement * temperature;
    let mut largest = 0.0f32;
    for i in 0..n {
        if frozen[i] {
            velocities[i] = Position::ORIGIN;
            continue;
        }
        let mut v = (velocities[i] + forces[i]) * params.damping;
        if !dims.is_3d() {
            v.z = 0.0;
        }
        let step = v.clamp_length(cap);
        velocities[i] = step;
        positions[i] += step;
        largest = largest.max(step.length());
    }
    largest
}

#[cfg(test)]
mod tests {
    use super::*;
    use notemap_core::{Coverage, Node, NoteGraph};

    fn pair_graph(weight: f32) -> LayoutGraph {
        let graph = NoteGraph::from_parts(
            vec![Node::new("a"), Node::new("b")],
            vec![("a".into(), "b".into(), weight)],
            Coverage::default(),
        )
        .unwrap();
        LayoutGraph::from_graph(&graph)
    }

    #[test]
    fn defaults_validate() {
        assert!(ForceParams::default().validate().is_ok());
        let bad = ForceParams {
            cooling: 1.0,
            ..ForceParams::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rest_length_grows_with_weight() {
        let params = ForceParams::default();
        assert_eq!(params.rest_length(0.0), 40.0);
        assert_eq!(params.rest_length(1.0), 100.0);
        assert_eq!(params.rest_length(0.5), 70.0);
        assert!(params.rest_length(0.9) > params.rest_length(0.5));
        // Out-of-range weights clamp.
        assert_eq!(params.rest_length(1.7), 100.0);
    }

    #[test]
    fn coincident_nodes_separate() {
        let graph = pair_graph(0.5);
        let mut positions = vec![Position::ORIGIN; 2];
        let mut velocities = vec![Position::ORIGIN; 2];
        let mut jitter = Jitter::new(3);
        relax(
            &graph,
            &ForceParams::default(),
            RelaxMode::Full,
            1.0,
            Dimensionality::Two,
            &[false, false],
            &mut positions,
            &mut velocities,
            &mut jitter,
        );
        assert_ne!(positions[0].to_bits(), positions[1].to_bits());
        assert!(positions.iter().all(|p| p.is_finite() && p.z == 0.0));
    }

    #[test]
    fn frozen_nodes_stay_put() {
        let graph = pair_graph(0.5);
        let mut positions = vec![Position::planar(0.0, 0.0), Position::planar(5.0, 0.0)];
        let mut velocities = vec![Position::ORIGIN; 2];
        let mut jitter = Jitter::new(3);
        relax(
            &graph,
            &ForceParams::default(),
            RelaxMode::Full,
            1.0,
            Dimensionality::Two,
            &[true, false],
            &mut positions,
            &mut velocities,
            &mut jitter,
        );
        assert_eq!(positions[0], Position::ORIGIN);
        assert!(positions[1].x > 5.0);
    }

    #[test]
    fn collision_mode_ignores_distant_pairs() {
        let graph = pair_graph(0.9);
        let mut positions = vec![Position::planar(0.0, 0.0), Position::planar(200.0, 0.0)];
        let mut velocities = vec![Position::ORIGIN; 2];
        let mut jitter = Jitter::new(3);
        let moved = relax(
            &graph,
            &ForceParams::default(),
            RelaxMode::CollisionOnly,
            1.0,
            Dimensionality::Two,
            &[false, false],
            &mut positions,
            &mut velocities,
            &mut jitter,
        );
        assert_eq!(moved, 0.0);
        assert_eq!(positions[1], Position::planar(200.0, 0.0));
    }

    #[test]
    fn warm_start_reuses_previous_positions() {
        let graph = pair_graph(0.5);
        let mut previous = HashMap::new();
        previous.insert(NoteId::from("a"), Position::new(3.0, 4.0, 9.0));
        let mut jitter = Jitter::new(5);
        let positions = initial_positions(&graph, Dimensionality::Two, &previous, &mut jitter);
        assert_eq!(positions[0], Position::planar(3.0, 4.0));
        // "b" starts next to its neighbour "a".
        assert!(positions[1].distance(positions[0]) <= 10.0 * 2f32.sqrt() + 1e-3);
    }
}
