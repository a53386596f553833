//! Commands a protocol can issue and data it receives from the environment.

use serde::{Deserialize, Serialize};
use swarmsim_types::{NodeId, Position};

/// Mobility state delivered to a protocol on every mobility update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// The node's current position.
    pub current_position: Position,
}

/// A request to deliver a message to one or all other nodes.
///
/// Payloads are opaque serialized strings; the engine never inspects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommunicationCommand {
    /// Deliver to every other node within the communication medium's reach.
    Broadcast { message: String },
    /// Deliver to a single node.
    Send { message: String, to: NodeId },
}

impl CommunicationCommand {
    /// Get a human-readable name for this command type.
    pub fn type_name(&self) -> &'static str {
        match self {
            CommunicationCommand::Broadcast { .. } => "Broadcast",
            CommunicationCommand::Send { .. } => "Send",
        }
    }
}

/// A request to change how the node moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MobilityCommand {
    /// Travel in a straight line toward `target` at `speed` meters per
    /// second. Supersedes any outstanding trajectory (last write wins).
    GoTo { target: Position, speed: f64 },
    /// Teleport instantly, discarding any outstanding trajectory.
    SetPosition { position: Position },
    /// Stop moving, discarding any outstanding trajectory.
    Idle,
}

/// An annotation for the visualization stream.
///
/// These commands only affect how the issuing node is rendered. Outside
/// prototype mode, or when no visualization handler is configured, they
/// degrade to no-ops and never change simulation outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualizationCommand {
    /// Set the node's display color (e.g. `"#ff0000"` or `"red"`).
    SetColor(String),
    /// Set a short label rendered next to the node.
    SetLabel(String),
}
