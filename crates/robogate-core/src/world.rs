// crates/robogate-core/src/world.rs
// ============================================================================
// Module: Robogate World Model
// Description: Static-ish map data served by the simulator adapter.
// Purpose: Provide the geofence, zones, obstacles, and bays used by the
//          policy engine and the agent's path reasoning.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The [`World`] snapshot changes rarely within a run and is cached by the
//! run loop with a short TTL (see the runtime crate). It is never mutated by
//! the governance layer itself; the simulator is the source of truth.

use serde::Deserialize;
use serde::Serialize;

use crate::telemetry::Point2;

/// Axis-aligned rectangle, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x bound.
    pub min_x: f64,
    /// Maximum x bound.
    pub max_x: f64,
    /// Minimum y bound.
    pub min_y: f64,
    /// Maximum y bound.
    pub max_y: f64,
}

impl Rect {
    /// Returns whether a point lies within the rectangle, inclusive of edges.
    #[must_use]
    pub fn contains(&self, point: Point2) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

/// A named zone with its spatial extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedZone {
    /// Human-readable zone name.
    pub name: String,
    /// Zone extent.
    pub rect: Rect,
}

/// A circular static obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Center x, meters.
    pub x: f64,
    /// Center y, meters.
    pub y: f64,
    /// Radius, meters.
    pub r: f64,
}

impl Obstacle {
    /// Returns the obstacle's center as a point.
    #[must_use]
    pub const fn center(self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Known human position and motion, if the world model tracks one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanMarker {
    /// Last known x, meters.
    pub x: f64,
    /// Last known y, meters.
    pub y: f64,
}

/// A loading or staging bay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bay {
    /// Bay identifier.
    pub id: String,
    /// Bay x, meters.
    pub x: f64,
    /// Bay y, meters.
    pub y: f64,
    /// Bay type label, e.g. "loading" or "staging".
    #[serde(rename = "type")]
    pub bay_type: String,
}

/// Static-ish map served by the simulator.
///
/// # Invariants
/// - `geofence` bounds every valid robot and target position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// The operational boundary; proposals targeting outside this fail
    /// `GEOFENCE_01`.
    pub geofence: Rect,
    /// Named zones, used to resolve per-zone speed limits.
    pub zones: Vec<NamedZone>,
    /// Known static obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Last known human position, if tracked by the world model.
    #[serde(default)]
    pub human: Option<HumanMarker>,
    /// Loading/staging bays.
    #[serde(default)]
    pub bays: Vec<Bay>,
}

impl World {
    /// Returns the zone named `name`, if present.
    #[must_use]
    pub fn zone_named(&self, name: &str) -> Option<&NamedZone> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Returns the nearest obstacle to `point`, if any are known.
    #[must_use]
    pub fn nearest_obstacle(&self, point: Point2) -> Option<&Obstacle> {
        self.obstacles
            .iter()
            .min_by(|a, b| a.center().distance_to(point).total_cmp(&b.center().distance_to(point)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_inclusive_of_edges() {
        let rect = Rect { min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 };
        assert!(rect.contains(Point2::new(0.0, 0.0)));
        assert!(rect.contains(Point2::new(10.0, 10.0)));
        assert!(!rect.contains(Point2::new(10.0001, 5.0)));
    }

    #[test]
    fn nearest_obstacle_picks_the_closest_one() {
        let world = World {
            geofence: Rect { min_x: -10.0, max_x: 10.0, min_y: -10.0, max_y: 10.0 },
            zones: Vec::new(),
            obstacles: vec![Obstacle { x: 5.0, y: 0.0, r: 0.5 }, Obstacle { x: 1.0, y: 0.0, r: 0.5 }],
            human: None,
            bays: Vec::new(),
        };
        let nearest = world.nearest_obstacle(Point2::new(0.0, 0.0)).expect("at least one obstacle");
        assert!((nearest.x - 1.0).abs() < 1e-9);
    }
}
