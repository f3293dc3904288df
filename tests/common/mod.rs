//! Common test utilities for integration tests.
#![allow(dead_code)]

use bevy::math::DVec3;
use satscope::engine::SatelliteEngine;
use satscope::orbit::CircularOrbit;
use satscope::registry::BodyId;
use satscope::selection::PickRay;
use satscope::settings::EngineSettings;

pub const ISS_NAME: &str = "ISS (ZARYA)";
pub const ISS_LINE1: &str =
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

pub const GEO_NAME: &str = "GEO TEST SAT";
pub const GEO_LINE1: &str =
    "1 28884U 05041A   24001.50000000 -.00000100  00000-0  00000+0 0  9993";
pub const GEO_LINE2: &str =
    "2 28884   0.0500  90.0000 0002000 270.0000  45.0000  1.00271000 67897";

/// ISS group with the checksum digit of line 1 changed from 7 to 8.
pub fn broken_iss_group() -> String {
    let line1 = format!("{}8", &ISS_LINE1[..68]);
    format!("{}\n{}\n{}\n", ISS_NAME, line1, ISS_LINE2)
}

/// Engine starting at `start_time` with default settings, its wall clock
/// anchored at 0 so `advance(n)` moves `n` seconds at rate 1.
pub fn engine_at(start_time: f64) -> SatelliteEngine {
    let mut engine = SatelliteEngine::new(EngineSettings::default(), start_time);
    engine.clock_mut().anchor(0.0);
    engine
}

/// Stationary parametric body at `radius` on the +X axis.
pub fn stationary(engine: &mut SatelliteEngine, name: &str, radius: f64) -> BodyId {
    engine
        .admit(name, CircularOrbit::new(radius, 0.0, 0.0, 0.0).unwrap())
        .unwrap()
}

/// Ray looking straight down -Z at `target`.
pub fn ray_at(target: DVec3) -> PickRay {
    PickRay::new(target + DVec3::new(0.0, 0.0, 10.0), -DVec3::Z)
}

/// Ray that hits nothing near the origin.
pub fn empty_ray() -> PickRay {
    PickRay::new(DVec3::new(0.0, 50.0, 10.0), -DVec3::Z)
}

/// Count bodies flagged as selected.
pub fn selected_count(engine: &SatelliteEngine) -> usize {
    engine.frame().filter(|view| view.selected).count()
}
