//! LayoutEngine: one entry point over the four strategies.
//!
//! [`LayoutEngine::layout`] runs a simulation to completion on the calling
//! thread. [`LayoutEngine::start`] hands back the [`Simulation`] itself for
//! hosts that drive `step(dt)` from their own loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use notemap_core::{CancelToken, CoreError, Dimensionality, LayoutStrategy, NoteGraph};

use crate::error::LayoutError;
use crate::pins::PinOverlay;
use crate::result::LayoutResult;
use crate::simulation::{Simulation, StepStatus};
use crate::strategy::force::ForceParams;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub force: ForceParams,
    /// Simulated seconds a structured placement is held before smoothing.
    pub hold_duration: f32,
    /// Simulated seconds per step when running to completion.
    pub step_dt: f32,
    /// Mixed with the graph fingerprint to seed jitter.
    pub seed: u64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            force: ForceParams::default(),
            hold_duration: 1.0,
            step_dt: 1.0 / 60.0,
            seed: 0,
        }
    }
}

impl LayoutParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.force.validate()?;
        if !(self.hold_duration.is_finite() && self.hold_duration >= 0.0) {
            return Err(CoreError::InvalidConfig {
                field: "hold_duration",
                reason: format!("must be finite and non-negative, got {}", self.hold_duration),
            });
        }
        if !(self.step_dt.is_finite() && self.step_dt > 0.0) {
            return Err(CoreError::InvalidConfig {
                field: "step_dt",
                reason: format!("must be positive, got {}", self.step_dt),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    params: LayoutParams,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Result<Self, LayoutError> {
        params.validate()?;
        Ok(LayoutEngine { params })
    }

    /// Default parameters with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        LayoutEngine {
            params: LayoutParams {
                seed,
                ..LayoutParams::default()
            },
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Lays out `graph` without pins or cancellation.
    pub fn layout(
        &self,
        graph: &NoteGraph,
        strategy: LayoutStrategy,
        dims: Dimensionality,
        previous: Option<&LayoutResult>,
    ) -> Result<LayoutResult, LayoutError> {
        self.layout_with(graph, strategy, dims, previous, &PinOverlay::new(), &CancelToken::new())
    }

    /// Like [`layout`](Self::layout) but takes the strategy by name and the
    /// dimensionality as an axis count. Unknown names are rejected.
    pub fn layout_by_name(
        &self,
        graph: &NoteGraph,
        strategy: &str,
        dims: u8,
        previous: Option<&LayoutResult>,
    ) -> Result<LayoutResult, LayoutError> {
        let strategy: LayoutStrategy = strategy.parse()?;
        let dims = Dimensionality::try_from(dims)?;
        self.layout(graph, strategy, dims, previous)
    }

    pub fn layout_with(
        &self,
        graph: &NoteGraph,
        strategy: LayoutStrategy,
        dims: Dimensionality,
        previous: Option<&LayoutResult>,
        pins: &PinOverlay,
        cancel: &CancelToken,
    ) -> Result<LayoutResult, LayoutError> {
        let mut sim = self.start(graph, strategy, dims, previous, pins.clone(), cancel.clone());
        self.run(&mut sim)
    }

    /// Prepares a simulation without stepping it.
    pub fn start(
        &self,
        graph: &NoteGraph,
        strategy: LayoutStrategy,
        dims: Dimensionality,
        previous: Option<&LayoutResult>,
        pins: PinOverlay,
        cancel: CancelToken,
    ) -> Simulation {
        let previous = previous.map(LayoutResult::position_map).unwrap_or_else(HashMap::new);
        Simulation::new(graph, strategy, dims, &self.params, &previous, pins, cancel)
    }

    /// Steps `sim` at the configured `step_dt` until it settles or is cancelled.
    pub fn run(&self, sim: &mut Simulation) -> Result<LayoutResult, LayoutError> {
        loop {
            match sim.step(self.params.step_dt) {
                StepStatus::Running => continue,
                StepStatus::Settled => return Ok(sim.result()),
                StepStatus::Cancelled => return Err(LayoutError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notemap_core::{Coverage, Node};

    fn triangle() -> NoteGraph {
        NoteGraph::from_parts(
            ["a", "b", "c"].iter().map(|id| Node::new(*id)).collect(),
            vec![
                ("a".into(), "b".into(), 0.9),
                ("b".into(), "c".into(), 0.6),
                ("a".into(), "c".into(), 0.5),
            ],
            Coverage::default(),
        )
        .unwrap()
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let engine = LayoutEngine::default();
        let err = engine.layout_by_name(&triangle(), "grid", 2, None).unwrap_err();
        assert!(err.is_input_error());
        let err = engine.layout_by_name(&triangle(), "force", 4, None).unwrap_err();
        assert!(matches!(err, LayoutError::Core(CoreError::UnsupportedDimensionality { value: 4 })));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = LayoutParams {
            step_dt: 0.0,
            ..LayoutParams::default()
        };
        assert!(LayoutEngine::new(params).is_err());
    }

    #[test]
    fn same_seed_same_layout() {
        let engine = LayoutEngine::with_seed(42);
        let a = engine.layout(&triangle(), LayoutStrategy::Force, Dimensionality::Three, None).unwrap();
        let b = engine.layout(&triangle(), LayoutStrategy::Force, Dimensionality::Three, None).unwrap();
        assert_eq!(a, b);
        assert!(a.settled);
    }

    #[test]
    fn cancelled_run_returns_no_result() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = LayoutEngine::default()
            .layout_with(
                &triangle(),
                LayoutStrategy::Tree,
                Dimensionality::Two,
                None,
                &PinOverlay::new(),
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, LayoutError::Cancelled));
    }
}
