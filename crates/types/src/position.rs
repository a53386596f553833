//! 3-D cartesian positioning.

use serde::{Deserialize, Serialize};

/// A point in the simulated 3-D world, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another position.
    ///
    /// Range checks compare squared distances to avoid the square root on
    /// the communication hot path.
    pub fn squared_distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Move this position `step` meters straight toward `target`.
    ///
    /// Clamps at the target: if `step` covers the remaining distance the
    /// result is exactly `target`. A non-positive step leaves the position
    /// unchanged.
    pub fn step_towards(&self, target: &Position, step: f64) -> Position {
        if step <= 0.0 {
            return *self;
        }

        let remaining = self.distance(target);
        if step >= remaining || remaining == 0.0 {
            return *target;
        }

        let fraction = step / remaining;
        Position {
            x: self.x + (target.x - self.x) * fraction,
            y: self.y + (target.y - self.y) * fraction,
            z: self.z + (target.z - self.z) * fraction,
        }
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(a.squared_distance(&b), 25.0);
    }

    #[test]
    fn test_step_towards_partial() {
        let a = Position::new(0.0, 0.0, 0.0);
        let target = Position::new(10.0, 0.0, 0.0);
        let moved = a.step_towards(&target, 4.0);
        assert!((moved.x - 4.0).abs() < 1e-9);
        assert_eq!(moved.y, 0.0);
    }

    #[test]
    fn test_step_towards_clamps_at_target() {
        let a = Position::new(0.0, 0.0, 0.0);
        let target = Position::new(1.0, 1.0, 1.0);
        let moved = a.step_towards(&target, 100.0);
        assert_eq!(moved, target);
    }

    #[test]
    fn test_step_towards_zero_step() {
        let a = Position::new(2.0, 2.0, 2.0);
        let target = Position::new(5.0, 5.0, 5.0);
        assert_eq!(a.step_towards(&target, 0.0), a);
    }
}
