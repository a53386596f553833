//! Simulation-side handlers that give provider commands their semantics.
//!
//! Each handler owns one concern. The simulator routes drained provider
//! commands and popped events to the matching handler; a command whose
//! handler was not configured is logged and dropped rather than failing
//! the run.

mod assertion;
mod communication;
mod mobility;
mod timer;
mod visualization;

pub use assertion::{Assertion, AssertionHandler, AssertionKind};
pub use communication::{CommunicationHandler, CommunicationMedium, Delay};
pub use mobility::{MobilityConfig, MobilityHandler};
pub use timer::TimerHandler;
pub use visualization::{
    NodeRecord, VisualizationConfig, VisualizationHandler, VisualizationUpdate,
};
