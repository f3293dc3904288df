//! Closed-form circular orbit used for stylised (non-TLE) bodies.

use bevy::math::{DQuat, DVec3};
use std::f64::consts::TAU;

use super::{FrameKind, FrameSample, OrbitError, PropagationError, Propagator};

/// Parametric circular orbit.
/// Angles in radians, radius in display units, time in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct CircularOrbit {
    /// Orbit radius (display units, > 0)
    pub radius: f64,
    /// Angular speed in radians per simulated second; the sign gives direction
    pub angular_speed: f64,
    /// Angle at `epoch` in radians
    pub phase: f64,
    /// Inclination of the orbit plane about the X (node) axis in radians
    pub inclination: f64,
    /// Simulated time (J2000 seconds) at which the body is at `phase`
    pub epoch: f64,
}

impl CircularOrbit {
    /// Create a circular orbit anchored at J2000.
    ///
    /// # Arguments
    /// * `radius` - Orbit radius in display units, must be positive
    /// * `angular_speed` - Radians per simulated second
    /// * `phase` - Initial angle in radians
    /// * `inclination` - Plane inclination in radians
    pub fn new(
        radius: f64,
        angular_speed: f64,
        phase: f64,
        inclination: f64,
    ) -> Result<Self, OrbitError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(OrbitError::InvalidRadius(radius));
        }
        if !angular_speed.is_finite() {
            return Err(OrbitError::NonFinite("angular_speed"));
        }
        if !phase.is_finite() {
            return Err(OrbitError::NonFinite("phase"));
        }
        if !inclination.is_finite() {
            return Err(OrbitError::NonFinite("inclination"));
        }

        Ok(Self {
            radius,
            angular_speed,
            phase,
            inclination,
            epoch: 0.0,
        })
    }

    /// Re-anchor the orbit so it is at `phase` at simulated time `epoch`.
    pub fn with_epoch(mut self, epoch: f64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Unwrapped angle along the orbit at `time`.
    pub fn angle_at(&self, time: f64) -> f64 {
        self.phase + self.angular_speed * (time - self.epoch)
    }

    /// Angle along the orbit at `time`, normalised to [0, 2π).
    pub fn phase_at(&self, time: f64) -> f64 {
        self.angle_at(time).rem_euclid(TAU)
    }

    /// Rotation taking the XZ orbit plane to the inclined plane.
    fn plane_rotation(&self) -> DQuat {
        DQuat::from_rotation_x(self.inclination)
    }
}

impl Propagator for CircularOrbit {
    fn evaluate(&self, simulated_time: f64) -> Result<FrameSample, PropagationError> {
        let angle = self.angle_at(simulated_time);
        let (sin_a, cos_a) = angle.sin_cos();
        let rotation = self.plane_rotation();

        let position = rotation * DVec3::new(self.radius * cos_a, 0.0, self.radius * sin_a);
        let speed = self.radius * self.angular_speed;
        let velocity = rotation * DVec3::new(-speed * sin_a, 0.0, speed * cos_a);

        Ok(FrameSample {
            position,
            velocity,
            frame: FrameKind::OrbitPlane,
        })
    }

    fn period(&self) -> Option<f64> {
        if self.angular_speed == 0.0 {
            None
        } else {
            Some(TAU / self.angular_speed.abs())
        }
    }
}
