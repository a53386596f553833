//! The per-node facade through which a protocol acts on its environment.

use crate::{CommunicationCommand, MobilityCommand, VisualizationCommand};
use std::time::Duration;
use swarmsim_types::NodeId;

/// Commands and queries a protocol can issue to its environment.
///
/// Every execution mode supplies its own implementation; the prototype-mode
/// provider records commands for the simulation engine, an integrated-mode
/// provider would forward them to an external simulator, and an experiment
/// provider would drive real hardware. Protocol code depends only on this
/// trait.
///
/// All command methods are fire-and-forget: they return immediately and
/// produce effects only through later engine callbacks. Queries
/// ([`current_time`](Provider::current_time), [`self_id`](Provider::self_id))
/// are answered from environment state and never block.
pub trait Provider {
    /// Send a message to a single node.
    fn send(&mut self, message: String, to: NodeId);

    /// Send a message to every other node in the simulation.
    fn broadcast(&mut self, message: String);

    /// Schedule a named timer to fire after `delay`.
    ///
    /// Scheduling a name that already has a pending timer replaces it:
    /// exactly one firing results, at the newest delay.
    fn schedule_timer(&mut self, name: &str, delay: Duration);

    /// Cancel a pending named timer. Canceling a name with no pending
    /// timer is a no-op.
    fn cancel_timer(&mut self, name: &str);

    /// Issue a mobility command.
    fn set_mobility(&mut self, command: MobilityCommand);

    /// Annotate this node in the visualization stream.
    ///
    /// Environments without visualization ignore these commands, so
    /// protocols may call this unconditionally without affecting
    /// portability.
    fn send_visualization(&mut self, command: VisualizationCommand) {
        let _ = command;
    }

    /// The current simulated (or wall-clock, in experiment mode) time.
    fn current_time(&self) -> Duration;

    /// This node's unique identifier.
    fn self_id(&self) -> NodeId;
}
