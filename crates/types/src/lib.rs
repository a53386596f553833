//! Core types shared by every swarmsim execution mode.
//!
//! Protocols, handlers, and the simulation engine all speak in terms of
//! [`NodeId`] and [`Position`]. Keeping these in a leaf crate means protocol
//! code carries no dependency on any particular engine.

mod position;

pub use position::Position;

use serde::{Deserialize, Serialize};

/// Unique identifier of a node within a simulation.
///
/// Ids are assigned sequentially from zero when the simulation is assembled
/// and are stable for the lifetime of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Get the raw id value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
