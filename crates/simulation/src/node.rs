//! Simulation nodes.

use crate::encapsulator::PrototypeEncapsulator;
use swarmsim_protocol::{AsAny, Protocol};
use swarmsim_types::{NodeId, Position};

/// A node inside the prototype simulation: identity, canonical position,
/// and the encapsulated protocol driving it.
///
/// Nodes live for the whole simulation. The position field is the single
/// source of truth for range checks and visualization; only the mobility
/// handler mutates it.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    position: Position,
    encapsulator: PrototypeEncapsulator,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Position, protocol: Box<dyn Protocol>) -> Self {
        Self {
            id,
            position,
            encapsulator: PrototypeEncapsulator::new(protocol, id),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn encapsulator_mut(&mut self) -> &mut PrototypeEncapsulator {
        &mut self.encapsulator
    }

    /// Downcast the node's protocol to its concrete type.
    ///
    /// Returns `None` if the node runs a different protocol. Used by
    /// per-protocol assertions and by tests inspecting final state.
    pub fn protocol<P: Protocol + 'static>(&self) -> Option<&P> {
        self.encapsulator.protocol().as_any().downcast_ref::<P>()
    }
}
