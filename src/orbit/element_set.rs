//! Two-line element sets propagated with SGP4/SDP4.
//!
//! Parsing and validation live in [`crate::tle`]; an [`ElementSet`] can only be
//! built from lines that passed column and checksum validation, and is
//! immutable afterwards.

use bevy::math::DVec3;
use std::fmt;

use super::{FrameKind, FrameSample, PropagationError, Propagator};
use crate::tle::{self, ParseError};
use crate::types::{
    DEEP_SPACE_PERIOD_MINUTES, EARTH_EQUATORIAL_RADIUS_KM, MINUTES_PER_DAY, SECONDS_PER_DAY,
    SECONDS_PER_JULIAN_YEAR,
};

/// WGS-72 gravitational parameter (km³/s²), the value SGP4 uses.
const MU_EARTH_KM3_S2: f64 = 398600.8;

/// Default span around the epoch inside which propagation is attempted.
pub const DEFAULT_MAX_SPAN_YEARS: f64 = 30.0;

/// Which SGP4 sub-model applies; fixed when the element set is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrbitRegime {
    /// Period below 225 minutes: SGP4 near-earth terms.
    NearEarth,
    /// Period of 225 minutes or more: SDP4 lunar/solar and resonance terms.
    DeepSpace,
}

impl OrbitRegime {
    /// Classify an orbit by its mean motion in revolutions per day.
    pub fn from_mean_motion(revs_per_day: f64) -> Self {
        let period_minutes = MINUTES_PER_DAY / revs_per_day;
        if period_minutes >= DEEP_SPACE_PERIOD_MINUTES {
            OrbitRegime::DeepSpace
        } else {
            OrbitRegime::NearEarth
        }
    }
}

/// Mean classical elements as written in the TLE (degrees, rev/day).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassicalElements {
    /// First derivative of mean motion divided by two (rev/day²)
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six (rev/day³)
    pub mean_motion_ddot: f64,
    /// B* drag term (1/earth radii)
    pub bstar: f64,
    pub inclination_deg: f64,
    pub right_ascension_deg: f64,
    pub eccentricity: f64,
    pub argument_of_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Mean motion (rev/day)
    pub mean_motion: f64,
    pub revolution_number: u64,
}

impl From<&sgp4::Elements> for ClassicalElements {
    fn from(elements: &sgp4::Elements) -> Self {
        Self {
            mean_motion_dot: elements.mean_motion_dot,
            mean_motion_ddot: elements.mean_motion_ddot,
            bstar: elements.drag_term,
            inclination_deg: elements.inclination,
            right_ascension_deg: elements.right_ascension,
            eccentricity: elements.eccentricity,
            argument_of_perigee_deg: elements.argument_of_perigee,
            mean_anomaly_deg: elements.mean_anomaly,
            mean_motion: elements.mean_motion,
            revolution_number: elements.revolution_number,
        }
    }
}

/// A validated, immutable element set with initialised SGP4 constants.
#[derive(Clone)]
pub struct ElementSet {
    name: String,
    norad_id: u32,
    classification: char,
    international_designator: String,
    /// Epoch in seconds since J2000
    epoch: f64,
    elements: ClassicalElements,
    regime: OrbitRegime,
    max_span_seconds: f64,
    line1: String,
    line2: String,
    constants: sgp4::Constants,
}

impl ElementSet {
    /// Parse and validate one name/line1/line2 group.
    pub fn from_lines(name: &str, line1: &str, line2: &str) -> Result<Self, ParseError> {
        tle::parse_element_set(name, line1, line2)
    }

    /// Wrap elements decoded by `sgp4`; the epoch is taken from the decoded
    /// timestamp.
    pub(crate) fn from_validated(
        name: String,
        norad_id: u32,
        decoded: &sgp4::Elements,
        lines: (String, String),
        constants: sgp4::Constants,
    ) -> Self {
        let elements = ClassicalElements::from(decoded);
        let classification = match decoded.classification {
            sgp4::Classification::Unclassified => 'U',
            sgp4::Classification::Classified => 'C',
            sgp4::Classification::Secret => 'S',
        };
        Self {
            name,
            norad_id,
            classification,
            international_designator: decoded.international_designator.clone().unwrap_or_default(),
            epoch: decoded.epoch() * SECONDS_PER_JULIAN_YEAR,
            elements,
            regime: OrbitRegime::from_mean_motion(elements.mean_motion),
            max_span_seconds: DEFAULT_MAX_SPAN_YEARS * SECONDS_PER_JULIAN_YEAR,
            line1: lines.0,
            line2: lines.1,
            constants,
        }
    }

    /// Limit propagation to `years` either side of the epoch.
    pub fn with_max_span_years(mut self, years: f64) -> Self {
        self.max_span_seconds = years.abs() * SECONDS_PER_JULIAN_YEAR;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u32 {
        self.norad_id
    }

    pub fn classification(&self) -> char {
        self.classification
    }

    pub fn international_designator(&self) -> &str {
        &self.international_designator
    }

    /// Epoch in seconds since J2000.
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    pub fn elements(&self) -> &ClassicalElements {
        &self.elements
    }

    /// Mean motion in revolutions per day.
    pub fn mean_motion(&self) -> f64 {
        self.elements.mean_motion
    }

    pub fn regime(&self) -> OrbitRegime {
        self.regime
    }

    pub fn lines(&self) -> (&str, &str) {
        (&self.line1, &self.line2)
    }

    /// Mean semi-major axis in km, from Kepler's third law.
    pub fn semi_major_axis_km(&self) -> f64 {
        let n = self.elements.mean_motion * std::f64::consts::TAU / SECONDS_PER_DAY;
        (MU_EARTH_KM3_S2 / (n * n)).cbrt()
    }
}

impl Propagator for ElementSet {
    fn evaluate(&self, simulated_time: f64) -> Result<FrameSample, PropagationError> {
        let offset = simulated_time - self.epoch;
        if !offset.is_finite() || offset.abs() > self.max_span_seconds {
            return Err(PropagationError::Undefined {
                reason: format!(
                    "{:.1} days from epoch exceeds the propagation window",
                    offset / SECONDS_PER_DAY
                ),
            });
        }

        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(offset / 60.0))
            .map_err(|e| PropagationError::Decayed {
                reason: format!("{e:?}"),
            })?;

        let position = DVec3::from_array(prediction.position);
        let velocity = DVec3::from_array(prediction.velocity);
        check_physical(position, velocity)?;

        Ok(FrameSample {
            position,
            velocity,
            frame: FrameKind::Eci,
        })
    }

    fn period(&self) -> Option<f64> {
        if self.elements.mean_motion > 0.0 {
            Some(SECONDS_PER_DAY / self.elements.mean_motion)
        } else {
            None
        }
    }
}

/// Reject states SGP4 can emit without reporting an error.
fn check_physical(position: DVec3, velocity: DVec3) -> Result<(), PropagationError> {
    if !position.is_finite() || !velocity.is_finite() {
        return Err(PropagationError::Undefined {
            reason: "model returned a non-finite state".to_string(),
        });
    }

    let radius = position.length();
    if radius < EARTH_EQUATORIAL_RADIUS_KM {
        return Err(PropagationError::Decayed {
            reason: format!("geocentric radius {radius:.1} km is below the surface"),
        });
    }

    Ok(())
}

impl fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSet")
            .field("name", &self.name)
            .field("norad_id", &self.norad_id)
            .field("epoch", &self.epoch)
            .field("regime", &self.regime)
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}
