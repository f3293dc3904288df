//! Pointer hit-testing and exclusive selection.
//!
//! [`InteractionResolver`] owns the hover/selection state machine. It reads
//! body positions from the registry and writes back only the `selected`
//! flag, so at most one body is ever selected.

use bevy::math::DVec3;
use bevy::prelude::*;

use crate::registry::{BodyId, BodyRegistry};

/// Pointer ray in render space. `direction` need not be normalised.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickRay {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl PickRay {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `origin` through `target`.
    pub fn towards(origin: DVec3, target: DVec3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Distance along the ray at which it enters a sphere, or `None` if it
    /// misses or the sphere lies entirely behind the origin. An origin inside
    /// the sphere enters at distance 0. A ray or sphere with non-finite
    /// components never hits.
    pub fn sphere_entry(&self, center: DVec3, radius: f64) -> Option<f64> {
        if !self.origin.is_finite() || !center.is_finite() || !radius.is_finite() {
            return None;
        }
        let direction = self.direction.try_normalize()?;
        let to_center = center - self.origin;
        let along = to_center.dot(direction);
        let miss_sq = to_center.length_squared() - along * along;
        let radius_sq = radius * radius;
        if miss_sq > radius_sq {
            return None;
        }
        let half_chord = (radius_sq - miss_sq).sqrt();
        let exit = along + half_chord;
        if exit < 0.0 {
            return None;
        }
        Some((along - half_chord).max(0.0))
    }
}

/// Broadcast whenever the selected body changes; `None` means cleared.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionChanged(pub Option<BodyId>);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Idle,
    Hovering(BodyId),
    Selected(BodyId),
}

#[derive(Clone, Debug)]
pub struct InteractionResolver {
    state: SelectionState,
    pick_radius: f64,
}

impl Default for InteractionResolver {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl InteractionResolver {
    pub fn new(pick_radius: f64) -> Self {
        Self {
            state: SelectionState::Idle,
            pick_radius,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn pick_radius(&self) -> f64 {
        self.pick_radius
    }

    pub fn selected(&self) -> Option<BodyId> {
        match self.state {
            SelectionState::Selected(id) => Some(id),
            _ => None,
        }
    }

    pub fn hovered(&self) -> Option<BodyId> {
        match self.state {
            SelectionState::Hovering(id) => Some(id),
            _ => None,
        }
    }

    /// Nearest body whose pick sphere the ray enters. Bodies that never had
    /// a valid position are skipped; stale ones are tested where they were
    /// last seen.
    pub fn hit_test(&self, ray: &PickRay, registry: &BodyRegistry) -> Option<BodyId> {
        let mut closest: Option<(BodyId, f64)> = None;

        for body in registry.iter() {
            let Some(position) = body.valid_position() else {
                continue;
            };
            let Some(distance) = ray.sphere_entry(position, self.pick_radius) else {
                continue;
            };
            if closest.is_none_or(|(_, d)| distance < d) {
                closest = Some((body.id(), distance));
            }
        }

        closest.map(|(id, _)| id)
    }

    /// Hover tracking. Never emits an event and never changes a selection.
    pub fn pointer_move(&mut self, ray: &PickRay, registry: &BodyRegistry) {
        if matches!(self.state, SelectionState::Selected(_)) {
            return;
        }
        self.state = match self.hit_test(ray, registry) {
            Some(id) => SelectionState::Hovering(id),
            None => SelectionState::Idle,
        };
    }

    /// Select the body under the ray. A miss keeps an existing selection.
    pub fn pointer_click(
        &mut self,
        ray: &PickRay,
        registry: &mut BodyRegistry,
    ) -> Option<SelectionChanged> {
        match self.hit_test(ray, registry) {
            Some(id) => self.select(id, registry),
            None => {
                if let SelectionState::Hovering(_) = self.state {
                    self.state = SelectionState::Idle;
                }
                None
            }
        }
    }

    /// Select `id` directly, e.g. from a body list. Unknown ids are ignored.
    /// Selecting the current selection again is a no-op.
    pub fn select(&mut self, id: BodyId, registry: &mut BodyRegistry) -> Option<SelectionChanged> {
        if !registry.contains(id) || self.selected() == Some(id) {
            return None;
        }
        if let Some(previous) = self.selected() {
            registry.set_selected(previous, false);
        }
        registry.set_selected(id, true);
        self.state = SelectionState::Selected(id);
        debug!("Selected body {}", id);
        Some(SelectionChanged(Some(id)))
    }

    /// Drop any selection or hover.
    pub fn clear(&mut self, registry: &mut BodyRegistry) -> Option<SelectionChanged> {
        let previous = self.selected();
        self.state = SelectionState::Idle;
        let id = previous?;
        registry.set_selected(id, false);
        Some(SelectionChanged(None))
    }

    /// Forget a body that has left the registry.
    pub fn body_removed(&mut self, id: BodyId) -> Option<SelectionChanged> {
        match self.state {
            SelectionState::Selected(selected) if selected == id => {
                self.state = SelectionState::Idle;
                Some(SelectionChanged(None))
            }
            SelectionState::Hovering(hovered) if hovered == id => {
                self.state = SelectionState::Idle;
                None
            }
            _ => None,
        }
    }
}
