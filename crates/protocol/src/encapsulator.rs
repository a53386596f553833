//! The binding between a protocol instance and one execution mode.

use crate::Telemetry;
use swarmsim_types::NodeId;

/// Forwards engine callbacks to an owned protocol instance.
///
/// Each execution mode implements this trait once: the encapsulator owns
/// the protocol together with the mode's concrete provider and forwards
/// every callback, so the environment driving the node never handles the
/// protocol directly. Construction is mode-specific (the prototype-mode
/// encapsulator is built by the simulation engine; integrated and
/// experiment encapsulators live outside this workspace).
pub trait Encapsulator {
    /// Deliver the one-time initialization callback.
    fn initialize(&mut self);

    /// Deliver a fired timer.
    fn handle_timer(&mut self, timer: &str);

    /// Deliver an arriving packet.
    fn handle_packet(&mut self, sender: NodeId, message: &str);

    /// Deliver a mobility update.
    fn handle_telemetry(&mut self, telemetry: &Telemetry);

    /// Deliver the one-time finalization callback.
    fn finish(&mut self);
}
