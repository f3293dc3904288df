//! Simulation clock.
//!
//! Maps host wall-clock seconds to simulated J2000 seconds under an adjustable
//! rate multiplier. The clock never reads the wall clock itself; callers pass
//! `wall_now` in, which keeps it deterministic under test.

use bevy::log::info;

use crate::types::{SECONDS_PER_DAY, current_j2000_seconds, j2000_seconds_to_date_string};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ClockError {
    #[error("clock rate must be finite and non-negative, got {0}")]
    InvalidRate(f64),
}

/// Simulated time advanced by wall-clock ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationClock {
    /// Simulated seconds per wall second
    rate: f64,
    /// Current time in seconds since J2000 epoch
    simulated_time: f64,
    /// Wall time of the last tick (host seconds, any origin). Unset until
    /// the first tick or reset.
    wall_reference: Option<f64>,
    paused: bool,
    /// Time restored by [`SimulationClock::restart`]
    initial: f64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::at_j2000_seconds(current_j2000_seconds())
    }
}

impl SimulationClock {
    /// Clock starting at `seconds` with rate 1. The first tick only anchors
    /// the wall reference, so a clock created late does not jump.
    pub fn at_j2000_seconds(seconds: f64) -> Self {
        Self {
            rate: 1.0,
            simulated_time: seconds,
            wall_reference: None,
            paused: false,
            initial: seconds,
        }
    }

    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }

    /// Current time in days since J2000
    pub fn days(&self) -> f64 {
        self.simulated_time / SECONDS_PER_DAY
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn wall_reference(&self) -> Option<f64> {
        self.wall_reference
    }

    /// Measure the next tick from `wall_now` without advancing.
    pub fn anchor(&mut self, wall_now: f64) {
        if wall_now.is_finite() {
            self.wall_reference = Some(wall_now);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Time that [`SimulationClock::restart`] returns to.
    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Advance by the wall time elapsed since the previous tick.
    ///
    /// A wall clock that steps backwards advances nothing; the reference
    /// still moves to `wall_now` so the next tick measures from there. An
    /// unanchored clock only takes the reference.
    pub fn tick(&mut self, wall_now: f64) -> f64 {
        if let Some(reference) = self.wall_reference {
            let elapsed = (wall_now - reference).max(0.0);
            if !self.paused && elapsed.is_finite() {
                self.simulated_time += elapsed * self.rate;
            }
        }
        self.anchor(wall_now);
        self.simulated_time
    }

    /// Change the rate multiplier. Takes effect from the next tick, so
    /// simulated time does not jump.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), ClockError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ClockError::InvalidRate(rate));
        }
        if rate != self.rate {
            info!("Clock rate: {}x", rate);
        }
        self.rate = rate;
        Ok(())
    }

    /// Scrub to `to_time`; the next tick measures from `wall_now`.
    pub fn reset(&mut self, to_time: f64, wall_now: f64) {
        self.simulated_time = to_time;
        self.anchor(wall_now);
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!("Simulation paused");
        }
    }

    pub fn play(&mut self) {
        if self.paused {
            self.paused = false;
            info!("Simulation running");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.play();
        } else {
            self.pause();
        }
    }

    /// Return to the initial time, paused.
    pub fn restart(&mut self, wall_now: f64) {
        self.reset(self.initial, wall_now);
        self.pause();
    }

    /// Current simulated time formatted as a UTC date.
    pub fn date_string(&self) -> String {
        j2000_seconds_to_date_string(self.simulated_time)
    }
}
