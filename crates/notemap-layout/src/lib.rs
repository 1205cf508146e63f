pub mod engine;
pub mod error;
pub mod jitter;
pub mod layout_graph;
pub mod pins;
pub mod result;
pub mod simulation;
pub mod strategy;

pub use engine::{LayoutEngine, LayoutParams};
pub use error::LayoutError;
pub use pins::PinOverlay;
pub use result::{LayoutResult, Placement};
pub use simulation::{Phase, Simulation, StepStatus};
pub use strategy::force::ForceParams;
