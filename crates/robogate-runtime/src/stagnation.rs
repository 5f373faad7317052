// crates/robogate-runtime/src/stagnation.rs
// ============================================================================
// Module: Stagnation Detector
// Description: Tracks per-run progress toward the goal and flags runs that
//              have stopped making meaningful progress (§4.7).
// Purpose: Surface a recoverable ALERT rather than aborting a run that is
//          simply stuck near an obstacle or waiting out a human detection.
// Dependencies: robogate-config
// ============================================================================

//! ## Overview
//! [`StagnationDetector`] is per-run, owned by the control loop, and fed one
//! goal-distance sample per executed tick. It does not itself append events
//! or broadcast; the control loop does that when [`StagnationOutcome::tripped`]
//! is true.

use robogate_config::StagnationConfig;

/// The result of observing one tick's progress toward the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagnationOutcome {
    /// Whether this observation tripped the detector.
    pub tripped: bool,
    /// Consecutive low-progress ticks counted so far (post-observation).
    pub stagnant_cycles: u32,
}

/// Counts consecutive low-progress ticks and trips once a threshold is
/// reached, per run.
///
/// # Invariants
/// - A tick counts as stagnant only while `goal_distance > min_distance_m`:
///   a robot idling at the goal is not stagnating.
/// - Tripping resets the counter to zero; the detector never re-fires on the
///   same streak without fresh low-progress ticks.
#[derive(Debug, Clone, Copy)]
pub struct StagnationDetector {
    config: StagnationConfig,
    prev_goal_distance: Option<f64>,
    stagnant_cycles: u32,
}

impl StagnationDetector {
    /// Creates a detector using the given thresholds.
    #[must_use]
    pub const fn new(config: StagnationConfig) -> Self {
        Self { config, prev_goal_distance: None, stagnant_cycles: 0 }
    }

    /// Records one tick's remaining distance to the goal, returning whether
    /// this observation trips the detector.
    pub fn observe(&mut self, goal_distance: f64) -> StagnationOutcome {
        let is_low_progress = match self.prev_goal_distance {
            Some(prev) => goal_distance > self.config.min_distance_m && prev - goal_distance < self.config.eps_m,
            None => false,
        };
        self.prev_goal_distance = Some(goal_distance);

        if is_low_progress {
            self.stagnant_cycles += 1;
        } else {
            self.stagnant_cycles = 0;
        }

        if self.stagnant_cycles >= self.config.cycles {
            let outcome = StagnationOutcome { tripped: true, stagnant_cycles: self.stagnant_cycles };
            self.stagnant_cycles = 0;
            outcome
        } else {
            StagnationOutcome { tripped: false, stagnant_cycles: self.stagnant_cycles }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StagnationConfig {
        StagnationConfig { cycles: 30, eps_m: 0.02, min_distance_m: 0.4 }
    }

    #[test]
    fn trips_after_thirty_low_progress_ticks_and_resets() {
        let mut detector = StagnationDetector::new(config());
        let mut tripped_at = None;
        let mut distance = 10.0;
        for i in 0 .. 40 {
            distance -= 0.001;
            let outcome = detector.observe(distance);
            if outcome.tripped {
                tripped_at = Some(i);
                break;
            }
        }
        assert_eq!(tripped_at, Some(30));
    }

    #[test]
    fn progress_above_epsilon_resets_the_counter() {
        let mut detector = StagnationDetector::new(config());
        for _ in 0 .. 29 {
            detector.observe(10.0);
        }
        let outcome = detector.observe(9.0);
        assert!(!outcome.tripped);
        assert_eq!(outcome.stagnant_cycles, 0);
    }

    #[test]
    fn does_not_trip_while_within_min_distance_of_goal() {
        let mut detector = StagnationDetector::new(config());
        for _ in 0 .. 40 {
            let outcome = detector.observe(0.1);
            assert!(!outcome.tripped);
        }
    }

    #[test]
    fn first_observation_never_trips() {
        let mut detector = StagnationDetector::new(config());
        let outcome = detector.observe(5.0);
        assert!(!outcome.tripped);
        assert_eq!(outcome.stagnant_cycles, 0);
    }
}
