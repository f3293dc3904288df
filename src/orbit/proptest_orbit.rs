//! Property-based tests for propagation, the clock and selection.

use bevy::math::DVec3;
use proptest::prelude::*;
use std::f64::consts::TAU;

use super::{CircularOrbit, OrbitDescriptor, Propagator};
use crate::frames::CoordinatePipeline;
use crate::registry::BodyRegistry;
use crate::selection::{InteractionResolver, PickRay};
use crate::test_utils::{assertions, fixtures};
use crate::time::SimulationClock;
use crate::types::SECONDS_PER_DAY;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Evaluating the same descriptor at the same time twice is bit-identical.
    #[test]
    fn prop_parametric_evaluation_is_deterministic(
        radius in 0.1f64..50.0,
        speed in -1.0f64..1.0,
        phase in 0.0f64..TAU,
        inclination in -3.0f64..3.0,
        t in -1.0e9f64..1.0e9,
    ) {
        let orbit = CircularOrbit::new(radius, speed, phase, inclination).unwrap();
        let a = orbit.evaluate(t).unwrap();
        let b = orbit.evaluate(t).unwrap();
        prop_assert_eq!(a.position.to_array().map(f64::to_bits), b.position.to_array().map(f64::to_bits));
    }

    #[test]
    fn prop_element_set_evaluation_is_deterministic(offset_days in -30.0f64..30.0) {
        let descriptor: OrbitDescriptor = fixtures::iss_element_set().into();
        let t = descriptor.as_element_set().unwrap().epoch() + offset_days * SECONDS_PER_DAY;
        prop_assert_eq!(descriptor.evaluate(t), descriptor.evaluate(t));
    }

    /// Parametric orbits never leave their circle, whatever the time.
    #[test]
    fn prop_parametric_radius_is_constant(
        radius in 0.1f64..50.0,
        speed in -1.0f64..1.0,
        inclination in -3.0f64..3.0,
        t in -1.0e6f64..1.0e6,
    ) {
        let orbit = CircularOrbit::new(radius, speed, 0.0, inclination).unwrap();
        let length = orbit.evaluate(t).unwrap().position.length();
        prop_assert!((length - radius).abs() < 1e-9 * radius.max(1.0));
    }

    /// Render positions are finite for any inertial direction, poles included.
    #[test]
    fn prop_pipeline_output_is_finite(
        x in -50_000.0f64..50_000.0,
        y in -50_000.0f64..50_000.0,
        z in 6_800.0f64..50_000.0,
        sign in prop::bool::ANY,
        t in -1.0e9f64..1.0e9,
    ) {
        let z = if sign { z } else { -z };
        let sample = super::FrameSample {
            position: DVec3::new(x, y, z),
            velocity: DVec3::ZERO,
            frame: super::FrameKind::Eci,
        };
        let render = CoordinatePipeline::default().to_render_space(&sample, t);
        prop_assert!(render.is_finite());
    }

    /// Simulated time never decreases, and stays put at rate 0.
    #[test]
    fn prop_clock_is_monotonic(
        rate in 0.0f64..1000.0,
        steps in prop::collection::vec(-5.0f64..5.0, 1..50),
    ) {
        let mut clock = SimulationClock::at_j2000_seconds(0.0);
        clock.set_rate(rate).unwrap();
        let mut frozen = clock.clone();
        frozen.set_rate(0.0).unwrap();

        let mut wall = 0.0;
        let mut previous = clock.simulated_time();
        for step in steps {
            wall += step;
            let now = clock.tick(wall);
            prop_assert!(now >= previous);
            previous = now;
            prop_assert_eq!(frozen.tick(wall), 0.0);
        }
    }

    /// Any sequence of clicks leaves at most one body selected, and clicking
    /// the selected body again changes nothing.
    #[test]
    fn prop_selection_is_exclusive(
        clicks in prop::collection::vec((0usize..6, prop::bool::ANY), 1..40),
    ) {
        let mut registry = BodyRegistry::new();
        let ids: Vec<_> = (0..5)
            .map(|i| {
                let orbit = CircularOrbit::new(3.0 + i as f64, 0.0, 0.0, 0.0).unwrap();
                registry.add(format!("Body {}", i), orbit).unwrap()
            })
            .collect();
        registry.refresh(0.0, &CoordinatePipeline::default());
        let mut resolver = InteractionResolver::default();

        for (target, repeat) in clicks {
            // Index 5 aims at empty space
            let x = 3.0 + target as f64;
            let ray = PickRay::new(DVec3::new(x, 0.0, 10.0), -DVec3::Z);
            resolver.pointer_click(&ray, &mut registry);
            assertions::assert_exclusive_selection(&registry);

            if repeat {
                let before = resolver.state();
                prop_assert!(resolver.pointer_click(&ray, &mut registry).is_none());
                prop_assert_eq!(resolver.state(), before);
            }
            if let Some(selected) = resolver.selected() {
                prop_assert!(ids.contains(&selected));
                prop_assert!(registry.get(selected).unwrap().is_selected());
            }
        }
    }
}
