//! Render-space geometry of propagated bodies.
//!
//! Checks the display-sphere mapping end to end: element sets propagate,
//! pass through the coordinate pipeline and land at the expected radius,
//! latitude band and hit-testable location.

mod common;

use approx::assert_relative_eq;
use common::*;
use satscope::frames::{CoordinatePipeline, greenwich_sidereal_angle};
use satscope::orbit::{ElementSet, Propagator};
use satscope::selection::{InteractionResolver, PickRay};
use satscope::settings::DisplayScale;

const SSO_LINE1: &str = "1 43013U 17073A   24015.25000000  .00000512  00000-0  24512-4 0  9994";
const SSO_LINE2: &str = "2 43013  98.7412 120.5531 0001245  95.3314 264.9001 14.19543210321006";

#[test]
fn test_geo_sits_near_equator_at_geo_radius() {
    let geo = ElementSet::from_lines(GEO_NAME, GEO_LINE1, GEO_LINE2).unwrap();
    let pipeline = CoordinatePipeline::default();
    for hour in 0..24 {
        let t = geo.epoch() + hour as f64 * 3600.0;
        let sample = geo.evaluate(t).unwrap();
        let render = pipeline.to_render_space(&sample, t);
        let geodetic = pipeline.geodetic(&sample, t).unwrap();

        // ~35786 km altitude at 1000 km per unit on a 3-unit globe
        assert_relative_eq!(render.length(), 3.0 + 35.786, epsilon = 0.3);
        assert!(geodetic.latitude_deg.abs() < 0.2, "lat {}", geodetic.latitude_deg);
    }
}

#[test]
fn test_geostationary_longitude_is_fixed_in_render_space() {
    let geo = ElementSet::from_lines(GEO_NAME, GEO_LINE1, GEO_LINE2).unwrap();
    let pipeline = CoordinatePipeline::default();
    let t0 = geo.epoch();
    let a = pipeline.to_render_space(&geo.evaluate(t0).unwrap(), t0);
    let b = pipeline.to_render_space(&geo.evaluate(t0 + 6.0 * 3600.0).unwrap(), t0 + 6.0 * 3600.0);

    // Earth-fixed render space: a geostationary body barely moves
    let drift_deg = a.normalize().angle_between(b.normalize()).to_degrees();
    assert!(drift_deg < 1.0, "drifted {} degrees", drift_deg);
}

#[test]
fn test_polar_orbit_stays_finite_over_a_pass() {
    let sso = ElementSet::from_lines("SSO", SSO_LINE1, SSO_LINE2).unwrap();
    let pipeline = CoordinatePipeline::default();
    let mut max_latitude: f64 = 0.0;
    for minute in 0..110 {
        let t = sso.epoch() + minute as f64 * 60.0;
        let sample = sso.evaluate(t).unwrap();
        let render = pipeline.to_render_space(&sample, t);
        assert!(render.is_finite());
        let geodetic = pipeline.geodetic(&sample, t).unwrap();
        max_latitude = max_latitude.max(geodetic.latitude_deg.abs());
    }
    // 98.7° inclination reaches ~81° latitude
    assert!((78.0..84.0).contains(&max_latitude), "max latitude {}", max_latitude);
}

#[test]
fn test_custom_scale() {
    let geo = ElementSet::from_lines(GEO_NAME, GEO_LINE1, GEO_LINE2).unwrap();
    let pipeline = CoordinatePipeline::new(DisplayScale {
        base_radius: 1.0,
        km_per_unit: 10_000.0,
        parametric_scale: 1.0,
    });
    let t = geo.epoch();
    let render = pipeline.to_render_space(&geo.evaluate(t).unwrap(), t);
    assert_relative_eq!(render.length(), 1.0 + 3.5786, epsilon = 0.03);
}

#[test]
fn test_propagated_body_is_pickable_where_rendered() {
    let mut engine = engine_at(0.0);
    let report = engine.load_tle_text(&format!("{}\n{}\n{}\n", GEO_NAME, GEO_LINE1, GEO_LINE2));
    let geo = report.admitted[0];
    let epoch = engine
        .registry()
        .get(geo)
        .unwrap()
        .descriptor()
        .as_element_set()
        .unwrap()
        .epoch();
    engine.clock_mut().reset(epoch, 0.0);
    engine.refresh();

    let position = engine.registry().get(geo).unwrap().position();
    let resolver = InteractionResolver::default();
    let ray = PickRay::towards(position * 2.0, position);
    assert_eq!(resolver.hit_test(&ray, engine.registry()), Some(geo));

    // A ray aimed a full unit off to the side misses
    let side = position.cross(bevy::math::DVec3::Y).normalize();
    let off = PickRay::towards(position * 2.0, position + side);
    assert_eq!(resolver.hit_test(&off, engine.registry()), None);
}

#[test]
fn test_central_body_rotation_tracks_clock() {
    let mut engine = engine_at(0.0);
    assert_eq!(engine.central_body_rotation(), greenwich_sidereal_angle(0.0));
    engine.set_rate(3600.0).unwrap();
    engine.advance(1.0);
    assert_eq!(engine.central_body_rotation(), greenwich_sidereal_angle(3600.0));
}
