//! Cooperative, step-driven layout simulation.
//!
//! A [`Simulation`] owns the working position buffer for one layout run. The
//! host calls [`Simulation::step`] repeatedly with the simulated time that
//! passed; the suspension point is between steps, so a host loop can yield,
//! render or handle input in between.
//!
//! # Phases
//!
//! ```text
//! Holding { release_at } --(elapsed >= release_at)--> Relaxing --> Settled
//!          \______________________ cancel __________________/--> Cancelled
//! ```
//!
//! Structured strategies start in `Holding`, keeping their placement fixed
//! until the simulated deadline, then smooth with collision-only forces.
//! The force strategy starts in `Relaxing` with full forces. Time is
//! simulated, never wall-clock, so runs are reproducible.
//!
//! Pins are read from the [`PinOverlay`] at the top of every step. A pinned
//! node sits exactly at its pinned coordinate and is never integrated.

use std::collections::{HashMap, HashSet};

use notemap_core::hash::{graph_fingerprint, seed_from};
use notemap_core::{CancelToken, Dimensionality, LayoutStrategy, NoteGraph, NoteId, Position};

use crate::engine::LayoutParams;
use crate::jitter::Jitter;
use crate::layout_graph::LayoutGraph;
use crate::pins::PinOverlay;
use crate::result::{LayoutResult, Placement};
use crate::strategy::force::{self, ForceParams, RelaxMode};
use crate::strategy::{initial_placement, spiral};

/// Below this largest per-node displacement the run counts as settled.
const MIN_MOVEMENT: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Placement held fixed until `release_at` simulated seconds.
    Holding { release_at: f32 },
    Relaxing,
    Settled,
    Cancelled,
}

/// Outcome of one [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    Settled,
    Cancelled,
}

#[derive(Debug)]
pub struct Simulation {
    graph: LayoutGraph,
    strategy: LayoutStrategy,
    dims: Dimensionality,
    force: ForceParams,
    positions: Vec<Position>,
    velocities: Vec<Position>,
    /// Held in place through smoothing (the radial centre).
    anchored: Vec<bool>,
    pinned: Vec<bool>,
    pins: PinOverlay,
    /// Overlay revision last applied.
    pin_revision: Option<u64>,
    cancel: CancelToken,
    jitter: Jitter,
    phase: Phase,
    elapsed: f32,
    temperature: f32,
    iterations: usize,
    max_iterations: usize,
    degenerate: bool,
}

impl Simulation {
    pub fn new(
        graph: &NoteGraph,
        strategy: LayoutStrategy,
        dims: Dimensionality,
        params: &LayoutParams,
        previous: &HashMap<NoteId, Position>,
        pins: PinOverlay,
        cancel: CancelToken,
    ) -> Self {
        let seed = params.seed ^ seed_from(&graph_fingerprint(graph));
        let mut jitter = Jitter::new(seed);
        let layout_graph = LayoutGraph::from_graph(graph);
        let placement = initial_placement(strategy, &layout_graph, dims, previous, &mut jitter);
        let n = layout_graph.len();

        let phase = if n == 0 {
            Phase::Settled
        } else if strategy.is_structured() && params.hold_duration > 0.0 {
            Phase::Holding {
                release_at: params.hold_duration,
            }
        } else {
            Phase::Relaxing
        };

        let mut sim = Simulation {
            graph: layout_graph,
            strategy,
            dims,
            force: params.force.clone(),
            positions: placement.positions,
            velocities: vec![Position::ORIGIN; n],
            anchored: placement.anchored,
            pinned: vec![false; n],
            pins,
            pin_revision: None,
            cancel,
            jitter,
            phase,
            elapsed: 0.0,
            temperature: params.force.initial_temperature,
            iterations: 0,
            max_iterations: params.force.max_iterations(dims),
            degenerate: false,
        };
        sim.apply_pins();
        tracing::debug!(
            strategy = %strategy,
            dims = %dims,
            nodes = n,
            seed,
            "layout simulation started"
        );
        sim
    }

    /// Advances the simulation by `dt` simulated seconds.
    ///
    /// While holding, a step only advances the clock. Once relaxing, each
    /// step runs exactly one relaxation iteration.
    pub fn step(&mut self, dt: f32) -> StepStatus {
        match self.phase {
            Phase::Settled => return StepStatus::Settled,
            Phase::Cancelled => return StepStatus::Cancelled,
            _ => {}
        }
        if self.cancel.is_cancelled() {
            self.phase = Phase::Cancelled;
            tracing::debug!(iterations = self.iterations, "layout cancelled");
            return StepStatus::Cancelled;
        }

        self.apply_pins();
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }

        if let Phase::Holding { release_at } = self.phase {
            if self.elapsed < release_at {
                return StepStatus::Running;
            }
            self.phase = Phase::Relaxing;
            tracing::debug!(elapsed = self.elapsed, "structured placement released");
        }

        let frozen: Vec<bool> = self
            .anchored
            .iter()
            .zip(&self.pinned)
            .map(|(&a, &p)| a || p)
            .collect();
        let mode = if self.strategy.is_structured() {
            RelaxMode::CollisionOnly
        } else {
            RelaxMode::Full
        };
        let moved = force::relax(
            &self.graph,
            &self.force,
            mode,
            self.temperature,
            self.dims,
            &frozen,
            &mut self.positions,
            &mut self.velocities,
            &mut self.jitter,
        );
        self.iterations += 1;
        self.temperature *= self.force.cooling;
        self.recover_non_finite();

        if moved < MIN_MOVEMENT
            || self.temperature < self.force.stop_threshold
            || self.iterations >= self.max_iterations
        {
            self.finish();
            return StepStatus::Settled;
        }
        StepStatus::Running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Settled
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    /// Current positions, indexed like [`ids`](Self::ids).
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn ids(&self) -> &[NoteId] {
        self.graph.ids()
    }

    /// Snapshot of the current state as a [`LayoutResult`].
    pub fn result(&self) -> LayoutResult {
        let positions = self
            .graph
            .ids()
            .iter()
            .enumerate()
            .map(|(i, id)| {
                (
                    id.clone(),
                    Placement {
                        position: self.positions[i],
                        degree: self.graph.degree(i),
                        pinned: self.pinned[i],
                    },
                )
            })
            .collect();
        LayoutResult {
            strategy: self.strategy,
            dimensionality: self.dims,
            positions,
            settled: self.is_settled(),
            iterations: self.iterations,
            degenerate: self.degenerate,
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn apply_pins(&mut self) {
        let revision = self.pins.revision();
        if self.pin_revision == Some(revision) {
            return;
        }
        self.pin_revision = Some(revision);

        let pins = self.pins.snapshot();
        for (i, id) in self.graph.ids().iter().enumerate() {
            match pins.get(id) {
                Some(&p) => {
                    self.positions[i] = if self.dims.is_3d() {
                        p
                    } else {
                        Position::planar(p.x, p.y)
                    };
                    self.velocities[i] = Position::ORIGIN;
                    self.pinned[i] = true;
                }
                None => self.pinned[i] = false,
            }
        }
    }

    /// Re-places every free node on the spiral if any coordinate blew up.
    fn recover_non_finite(&mut self) {
        if self.positions.iter().all(|p| p.is_finite()) {
            return;
        }
        tracing::warn!(
            strategy = %self.strategy,
            iteration = self.iterations,
            "non-finite layout coordinates, falling back to spiral placement"
        );
        for (rank, i) in self.graph.degree_ranking().into_iter().enumerate() {
            if !self.pinned[i] {
                self.positions[i] = spiral::spiral_point(rank, self.dims);
                self.velocities[i] = Position::ORIGIN;
            }
        }
        self.degenerate = true;
    }

    /// Jitters free nodes until no two share bit-identical coordinates.
    /// Pinned and anchored nodes keep their place.
    fn separate_coincident(&mut self) {
        let fixed = |i: usize| self.pinned[i] || self.anchored[i];
        let mut seen: HashSet<[u32; 3]> = (0..self.positions.len())
            .filter(|&i| fixed(i))
            .map(|i| self.positions[i].to_bits())
            .collect();

        let mut moved = 0usize;
        for i in 0..self.positions.len() {
            if self.pinned[i] || self.anchored[i] {
                continue;
            }
            let mut p = self.positions[i];
            let mut attempt = 0u32;
            while seen.contains(&p.to_bits()) {
                attempt += 1;
                p = self.jitter.nudge(p, attempt as f32, self.dims);
            }
            if attempt > 0 {
                self.positions[i] = p;
                moved += 1;
            }
            seen.insert(p.to_bits());
        }

        if moved > 0 {
            tracing::warn!(
                strategy = %self.strategy,
                moved,
                "coincident layout positions separated with jitter"
            );
            self.degenerate = true;
        }
    }

    fn finish(&mut self) {
        self.separate_coincident();
        self.phase = Phase::Settled;
        tracing::debug!(
            strategy = %self.strategy,
            iterations = self.iterations,
            elapsed = self.elapsed,
            degenerate = self.degenerate,
            "layout settled"
        );
    }
}
