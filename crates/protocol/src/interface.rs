//! The protocol reaction contract.

use crate::{Provider, Telemetry};
use std::any::Any;
use swarmsim_types::NodeId;

/// Upcast helper so assertion predicates can inspect concrete protocol
/// state behind a `dyn Protocol`.
///
/// Implemented automatically for every `'static` type; protocol authors
/// never implement it by hand.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node's behavior: a reactive state machine driven by engine callbacks.
///
/// Lifecycle: the engine calls [`initialize`](Protocol::initialize) exactly
/// once at simulation start, delivers reaction callbacks for the remainder
/// of the run, and calls [`finish`](Protocol::finish) exactly once at the
/// end. No callback is ever invoked after `finish`.
///
/// # Guarantees required from implementations
///
/// - **Synchronous**: callbacks run to completion, no blocking I/O
/// - **Deterministic**: same state + callback sequence = same commands
/// - **Isolated**: all side effects go through the [`Provider`] argument
///
/// The isolation rule is what makes a protocol portable: the engine never
/// inspects protocol internals, and the protocol never touches engine state.
pub trait Protocol: AsAny {
    /// Called once when the simulation starts, before any other callback.
    /// Initialization order across nodes is unspecified; don't rely on
    /// other protocols having been initialized.
    fn initialize(&mut self, provider: &mut dyn Provider);

    /// Called when a previously scheduled timer fires.
    fn handle_timer(&mut self, provider: &mut dyn Provider, timer: &str) {
        let _ = (provider, timer);
    }

    /// Called when a message from another node arrives.
    fn handle_packet(&mut self, provider: &mut dyn Provider, sender: NodeId, message: &str) {
        let _ = (provider, sender, message);
    }

    /// Called regularly by the mobility module with the node's current
    /// mobility state.
    fn handle_telemetry(&mut self, provider: &mut dyn Provider, telemetry: &Telemetry) {
        let _ = (provider, telemetry);
    }

    /// Called once when the simulation finishes. Finalization order across
    /// nodes is unspecified.
    fn finish(&mut self, provider: &mut dyn Provider) {
        let _ = provider;
    }
}
