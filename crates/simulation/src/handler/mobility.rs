//! Continuous position updates driven by a periodic interpolation tick.

use crate::node::Node;
use crate::SimulationError;
use std::collections::HashMap;
use std::time::Duration;
use swarmsim_protocol::MobilityCommand;
use swarmsim_types::{NodeId, Position};
use tracing::{debug, warn};

/// Configuration for the mobility handler.
#[derive(Debug, Clone, PartialEq)]
pub struct MobilityConfig {
    /// Interval between position interpolation steps.
    pub update_rate: Duration,
    /// Speed in m/s used when a `GoTo` command carries a non-positive speed.
    pub default_speed: f64,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            update_rate: Duration::from_millis(10),
            default_speed: 10.0,
        }
    }
}

impl MobilityConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.update_rate.is_zero() {
            return Err(SimulationError::Config(
                "mobility update rate must be positive".into(),
            ));
        }
        if !self.default_speed.is_finite() || self.default_speed <= 0.0 {
            return Err(SimulationError::Config(format!(
                "mobility default speed must be positive, got {}",
                self.default_speed
            )));
        }
        Ok(())
    }
}

/// An active straight-line trajectory.
#[derive(Debug, Clone, Copy)]
struct Trajectory {
    target: Position,
    speed: f64,
}

/// Translates mobility commands into per-tick position interpolation.
///
/// Trajectories are last-write-wins: a new `GoTo` replaces any outstanding
/// one and continues from the current interpolated position. There is no
/// waypoint queue.
#[derive(Debug)]
pub struct MobilityHandler {
    config: MobilityConfig,
    trajectories: HashMap<NodeId, Trajectory>,
}

impl MobilityHandler {
    pub fn new(config: MobilityConfig) -> Self {
        Self {
            config,
            trajectories: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MobilityConfig {
        &self.config
    }

    /// Perform a mobility command issued by `node`.
    ///
    /// `SetPosition` mutates the node's canonical position directly (an
    /// instantaneous teleport) and, like `Idle`, discards any outstanding
    /// trajectory.
    pub fn handle_command(&mut self, command: MobilityCommand, node: &mut Node) {
        match command {
            MobilityCommand::GoTo { target, speed } => {
                let speed = if speed.is_finite() && speed > 0.0 {
                    speed
                } else {
                    warn!(
                        node = %node.id(),
                        speed,
                        default = self.config.default_speed,
                        "non-positive GoTo speed, using default"
                    );
                    self.config.default_speed
                };
                debug!(node = %node.id(), %target, speed, "trajectory set");
                self.trajectories.insert(node.id(), Trajectory { target, speed });
            }
            MobilityCommand::SetPosition { position } => {
                debug!(node = %node.id(), %position, "teleport");
                self.trajectories.remove(&node.id());
                node.set_position(position);
            }
            MobilityCommand::Idle => {
                self.trajectories.remove(&node.id());
            }
        }
    }

    /// Advance one node by one interpolation step.
    ///
    /// Returns the new position when the node has an active trajectory.
    /// Arrival clamps to the target exactly and clears the trajectory.
    pub fn advance(&mut self, node: NodeId, current: Position) -> Option<Position> {
        let trajectory = self.trajectories.get(&node)?;
        let step = trajectory.speed * self.config.update_rate.as_secs_f64();
        let next = current.step_towards(&trajectory.target, step);
        if next == trajectory.target {
            self.trajectories.remove(&node);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(update_rate: Duration) -> MobilityHandler {
        MobilityHandler::new(MobilityConfig {
            update_rate,
            default_speed: 10.0,
        })
    }

    #[test]
    fn test_advance_moves_toward_target() {
        let mut mobility = handler(Duration::from_secs(1));
        let node = NodeId(0);
        mobility.trajectories.insert(
            node,
            Trajectory {
                target: Position::new(10.0, 0.0, 0.0),
                speed: 1.0,
            },
        );

        let next = mobility.advance(node, Position::ORIGIN).unwrap();
        assert!((next.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_advance_clamps_and_clears_on_arrival() {
        let mut mobility = handler(Duration::from_secs(1));
        let node = NodeId(0);
        let target = Position::new(0.5, 0.0, 0.0);
        mobility
            .trajectories
            .insert(node, Trajectory { target, speed: 1.0 });

        let next = mobility.advance(node, Position::ORIGIN).unwrap();
        assert_eq!(next, target);
        assert!(mobility.advance(node, next).is_none());
    }

    #[test]
    fn test_idle_node_does_not_move() {
        let mut mobility = handler(Duration::from_secs(1));
        assert!(mobility.advance(NodeId(3), Position::ORIGIN).is_none());
    }

    #[test]
    fn test_validate_rejects_zero_update_rate() {
        let config = MobilityConfig {
            update_rate: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
