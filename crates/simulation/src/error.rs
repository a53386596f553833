//! Error types for the simulation engine.

use crate::handler::AssertionKind;
use std::time::Duration;
use swarmsim_types::NodeId;
use thiserror::Error;

/// Errors surfaced by simulation assembly and execution.
///
/// Expected-loss outcomes (out-of-range or probabilistically dropped
/// messages, canceling an unknown timer) are *not* errors; they are silent
/// and observable only through [`SimulationStats`](crate::SimulationStats).
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid configuration, rejected at assembly time before any event
    /// is scheduled.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An event was scheduled before the current simulation time. This is
    /// an engine invariant violation, not a user error.
    #[error("cannot schedule event at {requested:?}: earlier than current time {now:?}")]
    SchedulingInPast { requested: Duration, now: Duration },

    /// A message was addressed to a node that does not exist.
    #[error("message destination {0} does not exist")]
    UnknownDestination(NodeId),

    /// A message was addressed to its own sender. Use a timer instead.
    #[error("message destination equals sender {0}; use schedule_timer for self-signaling")]
    SelfDestination(NodeId),

    /// A registered assertion failed. Terminal: the run is aborted the
    /// instant an "always" assertion is false, or at finalization for an
    /// "eventually" assertion that never held.
    #[error("assertion \"{name}\" ({kind:?}) failed at t={time:?}, iteration {iteration}")]
    AssertionViolation {
        name: String,
        kind: AssertionKind,
        time: Duration,
        iteration: u64,
    },

    /// The visualization transport could not be started.
    #[error("visualization transport error: {0}")]
    Transport(#[from] std::io::Error),
}
