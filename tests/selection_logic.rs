//! Selection state machine driven through the engine.
//!
//! Covers hover, click, miss and removal the way an input layer would call
//! them, checking both engine state and the published changes.

mod common;

use bevy::math::DVec3;
use common::*;
use satscope::engine::SatelliteEngine;
use satscope::registry::BodyId;
use satscope::selection::{PickRay, SelectionChanged, SelectionState};

/// Stationary bodies on the +X axis at radius 3 and 6.
fn two_bodies() -> (SatelliteEngine, BodyId, BodyId) {
    let mut engine = engine_at(0.0);
    let near = stationary(&mut engine, "Near", 3.0);
    let far = stationary(&mut engine, "Far", 6.0);
    engine.refresh();
    (engine, near, far)
}

#[test]
fn test_hover_tracks_pointer_without_events() {
    let (mut engine, near, far) = two_bodies();

    engine.pointer_move(&ray_at(DVec3::new(3.0, 0.0, 0.0)));
    assert_eq!(engine.hovered(), Some(near));
    engine.pointer_move(&ray_at(DVec3::new(6.0, 0.0, 0.0)));
    assert_eq!(engine.hovered(), Some(far));
    engine.pointer_move(&empty_ray());
    assert_eq!(engine.hovered(), None);
    assert_eq!(engine.resolver().state(), SelectionState::Idle);

    assert!(engine.drain_selection_changes().is_empty());
    assert_eq!(selected_count(&engine), 0);
}

#[test]
fn test_click_switches_selection_exclusively() {
    let (mut engine, near, far) = two_bodies();

    let first = engine.pointer_click(&ray_at(DVec3::new(3.0, 0.0, 0.0)));
    assert_eq!(first, Some(SelectionChanged(Some(near))));
    let second = engine.pointer_click(&ray_at(DVec3::new(6.0, 0.0, 0.0)));
    assert_eq!(second, Some(SelectionChanged(Some(far))));

    assert_eq!(engine.selected(), Some(far));
    assert_eq!(selected_count(&engine), 1);
    assert!(!engine.registry().get(near).unwrap().is_selected());
    assert_eq!(
        engine.drain_selection_changes(),
        vec![SelectionChanged(Some(near)), SelectionChanged(Some(far))]
    );
}

#[test]
fn test_repeat_click_and_miss_keep_selection() {
    let (mut engine, near, _) = two_bodies();
    let ray = ray_at(DVec3::new(3.0, 0.0, 0.0));

    engine.pointer_click(&ray);
    engine.drain_selection_changes();

    assert_eq!(engine.pointer_click(&ray), None);
    assert_eq!(engine.pointer_click(&empty_ray()), None);
    assert_eq!(engine.selected(), Some(near));
    assert!(engine.drain_selection_changes().is_empty());
}

#[test]
fn test_hover_is_ignored_while_selected() {
    let (mut engine, near, _) = two_bodies();
    engine.pointer_click(&ray_at(DVec3::new(3.0, 0.0, 0.0)));

    engine.pointer_move(&ray_at(DVec3::new(6.0, 0.0, 0.0)));
    assert_eq!(engine.resolver().state(), SelectionState::Selected(near));
    assert_eq!(engine.hovered(), None);
}

#[test]
fn test_nearest_body_along_ray_wins() {
    let mut engine = engine_at(0.0);
    let front = stationary(&mut engine, "Front", 5.0);
    stationary(&mut engine, "Back", 3.0);
    engine.refresh();

    // Looking down -X from beyond both bodies
    let ray = PickRay::new(DVec3::new(20.0, 0.0, 0.0), -DVec3::X);
    assert_eq!(engine.pointer_click(&ray), Some(SelectionChanged(Some(front))));
}

#[test]
fn test_unpositioned_bodies_cannot_be_picked() {
    let mut engine = engine_at(0.0);
    let id = stationary(&mut engine, "Fresh", 3.0);

    // Not refreshed yet
    assert_eq!(engine.pointer_click(&ray_at(DVec3::new(3.0, 0.0, 0.0))), None);
    engine.refresh();
    assert_eq!(
        engine.pointer_click(&ray_at(DVec3::new(3.0, 0.0, 0.0))),
        Some(SelectionChanged(Some(id)))
    );
}

#[test]
fn test_clear_and_direct_select() {
    let (mut engine, near, far) = two_bodies();

    assert_eq!(engine.clear_selection(), None);
    assert_eq!(engine.select(far), Some(SelectionChanged(Some(far))));
    assert_eq!(engine.select(far), None);
    assert_eq!(engine.select(near), Some(SelectionChanged(Some(near))));
    assert_eq!(engine.clear_selection(), Some(SelectionChanged(None)));
    assert_eq!(selected_count(&engine), 0);
}

#[test]
fn test_removing_hovered_body_is_silent() {
    let (mut engine, near, _) = two_bodies();
    engine.pointer_move(&ray_at(DVec3::new(3.0, 0.0, 0.0)));
    assert_eq!(engine.hovered(), Some(near));

    engine.remove_body(near).unwrap();
    assert_eq!(engine.hovered(), None);
    assert!(engine.drain_selection_changes().is_empty());
}

#[test]
fn test_removing_other_body_keeps_selection() {
    let (mut engine, near, far) = two_bodies();
    engine.select(near);
    engine.drain_selection_changes();

    engine.remove_body(far).unwrap();
    assert_eq!(engine.selected(), Some(near));
    assert!(engine.drain_selection_changes().is_empty());
    assert!(engine.select(far).is_none());
}

#[test]
fn test_degenerate_ray_selects_nothing() {
    let (mut engine, _, _) = two_bodies();
    let ray = PickRay::new(DVec3::new(f64::NAN, 0.0, 0.0), -DVec3::Z);

    engine.pointer_move(&ray);
    assert_eq!(engine.hovered(), None);
    assert_eq!(engine.pointer_click(&ray), None);
    assert_eq!(engine.selected(), None);
    assert!(engine.drain_selection_changes().is_empty());
}
