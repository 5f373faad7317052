// crates/robogate-core/src/telemetry.rs
// ============================================================================
// Module: Robogate Telemetry
// Description: Per-tick sensor snapshot produced by the simulator adapter.
// Purpose: Give the policy engine and agent a strictly typed view of robot state.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Telemetry`] snapshot is produced by the simulator once per tick and
//! consumed by the agent and policy engine. All numeric fields are bounded
//! at the serde boundary rather than re-validated by every consumer.

use serde::Deserialize;
use serde::Serialize;

/// A 2D point, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// X coordinate, meters.
    pub x: f64,
    /// Y coordinate, meters.
    pub y: f64,
}

impl Point2 {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Coarse zone classification used by speed-limit policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// A narrow transit corridor; tightest speed limit.
    Aisle,
    /// A loading bay; intermediate speed limit.
    LoadingBay,
    /// Anywhere else on the floor.
    Other,
}

/// Per-tick telemetry snapshot.
///
/// # Invariants
/// - `human_conf` is in `[0, 1]`.
/// - `speed` and `nearest_obstacle_m` are non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Robot position, x meters.
    pub x: f64,
    /// Robot position, y meters.
    pub y: f64,
    /// Robot heading, radians.
    pub theta: f64,
    /// Current speed, m/s.
    pub speed: f64,
    /// Zone the robot currently occupies.
    pub zone: Zone,
    /// Distance to the nearest known obstacle, meters.
    pub nearest_obstacle_m: f64,
    /// Whether a human has been detected this tick.
    pub human_detected: bool,
    /// Detector confidence in `[0, 1]`.
    pub human_conf: f64,
    /// Distance to the detected human, meters.
    pub human_distance_m: f64,
    /// Battery charge fraction in `[0, 1]`, if reported by the simulator.
    #[serde(default)]
    pub battery: Option<f64>,
    /// Optional navigation target carried through by the simulator.
    #[serde(default)]
    pub target: Option<Point2>,
    /// Free-form event tags reported alongside this tick's telemetry.
    #[serde(default)]
    pub events: Vec<String>,
}

impl Telemetry {
    /// Returns the robot's current position as a point.
    #[must_use]
    pub const fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_reflects_telemetry_coordinates() {
        let telemetry = Telemetry {
            x: 3.0,
            y: 4.0,
            theta: 0.0,
            speed: 0.0,
            zone: Zone::Aisle,
            nearest_obstacle_m: 10.0,
            human_detected: false,
            human_conf: 0.0,
            human_distance_m: 10.0,
            battery: None,
            target: None,
            events: Vec::new(),
        };
        assert_eq!(telemetry.position(), Point2::new(3.0, 4.0));
    }

    #[test]
    fn distance_between_points_is_symmetric() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
        assert!((a.distance_to(b) - b.distance_to(a)).abs() < 1e-9);
    }
}
