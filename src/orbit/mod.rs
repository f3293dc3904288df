//! Orbit descriptors and the propagation contract.
//!
//! Every body carries one [`OrbitDescriptor`]. Evaluating a descriptor at a
//! simulated time is a pure function: the same descriptor and time always
//! produce the same [`FrameSample`] (or the same [`PropagationError`]).
//!
//! Two strategies implement [`Propagator`]:
//! - [`CircularOrbit`]: closed-form parametric circle in an inclined plane,
//!   already expressed in render space.
//! - [`ElementSet`]: SGP4/SDP4 propagation of a parsed two-line element set,
//!   producing Earth-centred inertial (TEME) kilometres.

pub mod circular;
pub mod element_set;

#[cfg(test)]
mod proptest_orbit;

pub use circular::CircularOrbit;
pub use element_set::{ElementSet, OrbitRegime};

use bevy::math::DVec3;

/// Reference frame a propagator reports its output in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Orbit-plane local frame of a parametric orbit; already render space.
    OrbitPlane,
    /// Earth-centred inertial (TEME), kilometres and km/s.
    Eci,
}

/// Raw propagator output before the coordinate pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    pub position: DVec3,
    pub velocity: DVec3,
    pub frame: FrameKind,
}

/// Why a descriptor could not be evaluated at a given time.
///
/// Both cases are recoverable: the registry keeps the body's last valid
/// position and flags it as stale.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("object has decayed: {reason}")]
    Decayed { reason: String },

    #[error("propagation undefined: {reason}")]
    Undefined { reason: String },
}

/// Invalid parameters for a parametric orbit.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OrbitError {
    #[error("orbit radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    #[error("orbital parameter `{0}` must be finite")]
    NonFinite(&'static str),
}

/// A strategy that maps simulated time to a position in its native frame.
pub trait Propagator {
    /// Evaluate at `simulated_time` (seconds since J2000).
    fn evaluate(&self, simulated_time: f64) -> Result<FrameSample, PropagationError>;

    /// Orbital period in seconds, if the orbit is periodic.
    fn period(&self) -> Option<f64>;
}

/// Normalised orbital description of one body.
#[derive(Clone, Debug)]
pub enum OrbitDescriptor {
    Parametric(CircularOrbit),
    ElementSet(Box<ElementSet>),
}

impl OrbitDescriptor {
    /// Native frame of this descriptor's samples.
    pub fn frame(&self) -> FrameKind {
        match self {
            OrbitDescriptor::Parametric(_) => FrameKind::OrbitPlane,
            OrbitDescriptor::ElementSet(_) => FrameKind::Eci,
        }
    }

    pub fn as_parametric(&self) -> Option<&CircularOrbit> {
        match self {
            OrbitDescriptor::Parametric(orbit) => Some(orbit),
            OrbitDescriptor::ElementSet(_) => None,
        }
    }

    pub fn as_element_set(&self) -> Option<&ElementSet> {
        match self {
            OrbitDescriptor::Parametric(_) => None,
            OrbitDescriptor::ElementSet(set) => Some(set),
        }
    }
}

impl Propagator for OrbitDescriptor {
    fn evaluate(&self, simulated_time: f64) -> Result<FrameSample, PropagationError> {
        match self {
            OrbitDescriptor::Parametric(orbit) => orbit.evaluate(simulated_time),
            OrbitDescriptor::ElementSet(set) => set.evaluate(simulated_time),
        }
    }

    fn period(&self) -> Option<f64> {
        match self {
            OrbitDescriptor::Parametric(orbit) => orbit.period(),
            OrbitDescriptor::ElementSet(set) => set.period(),
        }
    }
}

impl From<CircularOrbit> for OrbitDescriptor {
    fn from(orbit: CircularOrbit) -> Self {
        OrbitDescriptor::Parametric(orbit)
    }
}

impl From<ElementSet> for OrbitDescriptor {
    fn from(set: ElementSet) -> Self {
        OrbitDescriptor::ElementSet(Box::new(set))
    }
}
