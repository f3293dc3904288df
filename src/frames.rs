//! Coordinate pipeline: propagator frames to render space.
//!
//! Element-set samples arrive in the Earth-centred inertial frame. They are
//! rotated by Greenwich mean sidereal time into the Earth-fixed frame,
//! converted to geodetic latitude/longitude/altitude on the WGS-72 ellipsoid
//! and placed on a display sphere whose radius grows linearly with altitude.
//! Render space is Y-up with the central body at the origin, so it rotates
//! with the Earth: a renderer showing the Earth mesh should leave it
//! unrotated, or rotate everything by [`CoordinatePipeline::central_body_rotation`].
//!
//! Parametric samples are already in render space and are only rescaled.

use bevy::math::DVec3;

use crate::orbit::{FrameKind, FrameSample};
use crate::settings::DisplayScale;
use crate::types::{
    DEG_TO_RAD, EARTH_EQUATORIAL_RADIUS_KM, EARTH_FLATTENING, RAD_TO_DEG, RenderPosition,
    SECONDS_PER_DAY,
};

/// Longitude reported where it is undefined (on the rotation axis).
pub const POLE_LONGITUDE: f64 = 0.0;

/// Below this distance from the rotation axis (km) a point counts as polar.
const POLE_EPSILON_KM: f64 = 1e-9;

const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
const GMST_BASE_DEG: f64 = 280.46061837;
const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
const GMST_CORRECTION: f64 = 0.000387933;

/// Geodetic iteration stops once latitude moves less than this (radians).
const LATITUDE_TOLERANCE: f64 = 1e-12;
const MAX_GEODETIC_ITERATIONS: usize = 10;

/// Geodetic coordinates of a point above the reference ellipsoid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geodetic {
    /// Degrees, positive north
    pub latitude_deg: f64,
    /// Degrees in (-180, 180], positive east
    pub longitude_deg: f64,
    /// Height above the ellipsoid in km
    pub altitude_km: f64,
}

/// Greenwich mean sidereal time (IAU 1982) in radians, normalised to [0, 2π).
pub fn greenwich_sidereal_angle(simulated_time: f64) -> f64 {
    let days = simulated_time / SECONDS_PER_DAY;
    let centuries = days / DAYS_PER_JULIAN_CENTURY;
    let degrees = GMST_BASE_DEG + GMST_ROTATION_PER_DAY * days + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / 38710000.0;
    (degrees.rem_euclid(360.0)) * DEG_TO_RAD
}

/// Rotate an inertial vector into the Earth-fixed frame at sidereal angle `gmst`.
pub fn eci_to_ecef(position: DVec3, gmst: f64) -> DVec3 {
    let (sin_g, cos_g) = gmst.sin_cos();
    DVec3::new(
        position.x * cos_g + position.y * sin_g,
        -position.x * sin_g + position.y * cos_g,
        position.z,
    )
}

/// Earth-fixed km to geodetic coordinates on the WGS-72 ellipsoid.
///
/// On the rotation axis longitude is [`POLE_LONGITUDE`] and latitude is ±90°.
pub fn ecef_to_geodetic(ecef: DVec3) -> Geodetic {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let f = EARTH_FLATTENING;
    let b = a * (1.0 - f);
    let e2 = f * (2.0 - f);

    let p = ecef.x.hypot(ecef.y);
    if p < POLE_EPSILON_KM {
        let latitude_deg = if ecef.z < 0.0 { -90.0 } else { 90.0 };
        return Geodetic {
            latitude_deg,
            longitude_deg: POLE_LONGITUDE,
            altitude_km: ecef.z.abs() - b,
        };
    }

    let longitude = ecef.y.atan2(ecef.x);
    let mut latitude = ecef.z.atan2(p * (1.0 - e2));
    let mut altitude = 0.0;

    for _ in 0..MAX_GEODETIC_ITERATIONS {
        let sin_lat = latitude.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        // The cosine form loses precision near the poles
        altitude = if latitude.abs() < std::f64::consts::FRAC_PI_4 {
            p / latitude.cos() - n
        } else {
            ecef.z / sin_lat - n * (1.0 - e2)
        };
        let next = ecef.z.atan2(p * (1.0 - e2 * n / (n + altitude)));
        let converged = (next - latitude).abs() < LATITUDE_TOLERANCE;
        latitude = next;
        if converged {
            break;
        }
    }

    Geodetic {
        latitude_deg: latitude * RAD_TO_DEG,
        longitude_deg: longitude * RAD_TO_DEG,
        altitude_km: altitude,
    }
}

/// Maps propagator output into render space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoordinatePipeline {
    pub scale: DisplayScale,
}

impl CoordinatePipeline {
    pub fn new(scale: DisplayScale) -> Self {
        Self { scale }
    }

    /// Render-space position of a successful propagation sample.
    pub fn to_render_space(&self, sample: &FrameSample, simulated_time: f64) -> RenderPosition {
        match sample.frame {
            FrameKind::OrbitPlane => sample.position * self.scale.parametric_scale,
            FrameKind::Eci => {
                self.eci_to_render(sample.position, greenwich_sidereal_angle(simulated_time))
            }
        }
    }

    /// Render an inertial position with an explicit sidereal angle.
    ///
    /// Orbit tracks freeze the angle so the drawn path is the inertial orbit
    /// seen from the Earth-fixed frame at one instant.
    pub fn eci_to_render(&self, position: DVec3, gmst: f64) -> RenderPosition {
        self.geodetic_to_render(&ecef_to_geodetic(eci_to_ecef(position, gmst)))
    }

    /// Project geodetic coordinates onto the display sphere.
    pub fn geodetic_to_render(&self, geodetic: &Geodetic) -> RenderPosition {
        let radius = self.scale.display_radius(geodetic.altitude_km);
        let lat = geodetic.latitude_deg * DEG_TO_RAD;
        let lon = geodetic.longitude_deg * DEG_TO_RAD;
        DVec3::new(
            radius * lat.cos() * lon.cos(),
            radius * lat.sin(),
            radius * lat.cos() * lon.sin(),
        )
    }

    /// Geodetic coordinates of an inertial sample, for info readouts.
    ///
    /// Returns `None` for parametric samples, which have no ground position.
    pub fn geodetic(&self, sample: &FrameSample, simulated_time: f64) -> Option<Geodetic> {
        match sample.frame {
            FrameKind::OrbitPlane => None,
            FrameKind::Eci => Some(ecef_to_geodetic(eci_to_ecef(
                sample.position,
                greenwich_sidereal_angle(simulated_time),
            ))),
        }
    }

    /// Rotation of the central body about render-space Y at `simulated_time`.
    ///
    /// Render space is Earth-fixed, so a renderer that wants an inertial view
    /// rotates the scene by this angle; the Earth and the satellites then stay
    /// phase-locked to the simulation clock.
    pub fn central_body_rotation(&self, simulated_time: f64) -> f64 {
        greenwich_sidereal_angle(simulated_time)
    }
}
