//! Body registry: the authoritative collection of active bodies.
//!
//! Bodies are addressed by [`BodyId`] handles. The registry is the only owner;
//! everything else holds ids, so removing a body can never leave a dangling
//! reference behind. Ids are never reused within one registry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bevy::log::{debug, info, warn};

use crate::frames::CoordinatePipeline;
use crate::orbit::{OrbitDescriptor, PropagationError, Propagator};
use crate::types::RenderPosition;

/// Stable handle to a body in a [`BodyRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(u64);

impl BodyId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a body named '{0}' is already registered")]
    DuplicateName(String),

    #[error("body name must not be empty")]
    EmptyName,
}

/// One orbiting body and its latest render-space state.
#[derive(Clone, Debug)]
pub struct Body {
    id: BodyId,
    name: String,
    descriptor: OrbitDescriptor,
    position: RenderPosition,
    selected: bool,
    stale: bool,
    has_position: bool,
    last_error: Option<PropagationError>,
}

impl Body {
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &OrbitDescriptor {
        &self.descriptor
    }

    /// Last valid render-space position. Meaningless until
    /// [`Body::has_position`] is true.
    pub fn position(&self) -> RenderPosition {
        self.position
    }

    /// Position if one has ever been computed.
    pub fn valid_position(&self) -> Option<RenderPosition> {
        self.has_position.then_some(self.position)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The latest propagation failed; [`Body::position`] is from an earlier tick.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn has_position(&self) -> bool {
        self.has_position
    }

    /// Error from the latest failed propagation, cleared on recovery.
    pub fn last_error(&self) -> Option<&PropagationError> {
        self.last_error.as_ref()
    }
}

/// Read-only per-frame view handed to renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyView<'a> {
    pub id: BodyId,
    pub name: &'a str,
    pub position: RenderPosition,
    pub selected: bool,
    pub stale: bool,
}

/// Counts from one [`BodyRegistry::refresh`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: usize,
    pub failed: usize,
    /// Bodies whose propagation started failing on this pass
    pub newly_stale: usize,
    /// Bodies that propagated again after failing
    pub recovered: usize,
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: BTreeMap<BodyId, Body>,
    by_name: HashMap<String, BodyId>,
    next_id: u64,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a body. It has no position until the next [`BodyRegistry::refresh`].
    pub fn add(
        &mut self,
        name: impl Into<String>,
        descriptor: impl Into<OrbitDescriptor>,
    ) -> Result<BodyId, RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.by_name.insert(name.clone(), id);
        self.bodies.insert(
            id,
            Body {
                id,
                name,
                descriptor: descriptor.into(),
                position: RenderPosition::ZERO,
                selected: false,
                stale: false,
                has_position: false,
                last_error: None,
            },
        );
        Ok(id)
    }

    /// Remove a body. Removing an unknown id is a no-op.
    ///
    /// This does not touch selection state; go through
    /// `SatelliteEngine::remove_body` so the resolver sees the removal.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.remove(&id)?;
        self.by_name.remove(&body.name);
        Some(body)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<BodyId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in admission order.
    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    pub fn for_each(&self, mut f: impl FnMut(&Body)) {
        self.bodies.values().for_each(|body| f(body));
    }

    /// Recompute positions with a caller-supplied function. Returning `None`
    /// leaves that body's position untouched. The selection flag is not
    /// reachable from here; only the resolver writes it.
    pub fn for_each_mut(
        &mut self,
        mut f: impl FnMut(BodyId, &OrbitDescriptor) -> Option<RenderPosition>,
    ) {
        for body in self.bodies.values_mut() {
            if let Some(position) = f(body.id, &body.descriptor) {
                body.position = position;
                body.has_position = true;
            }
        }
    }

    /// Per-frame render view.
    pub fn frame(&self) -> impl Iterator<Item = BodyView<'_>> {
        self.bodies
            .values()
            .filter(|body| body.has_position)
            .map(|body| BodyView {
                id: body.id,
                name: &body.name,
                position: body.position,
                selected: body.selected,
                stale: body.stale,
            })
    }

    pub fn selected(&self) -> Option<BodyId> {
        self.bodies.values().find(|body| body.selected).map(|body| body.id)
    }

    pub(crate) fn set_selected(&mut self, id: BodyId, selected: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.selected = selected;
        }
    }

    /// Propagate every body to `simulated_time` and store its render position.
    ///
    /// A failing body keeps its last valid position and is flagged stale; the
    /// pipeline is not run for it. Failures never affect other bodies.
    pub fn refresh(
        &mut self,
        simulated_time: f64,
        pipeline: &CoordinatePipeline,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for body in self.bodies.values_mut() {
            match body.descriptor.evaluate(simulated_time) {
                Ok(sample) => {
                    body.position = pipeline.to_render_space(&sample, simulated_time);
                    body.has_position = true;
                    if body.stale {
                        info!("{} propagates again", body.name);
                        summary.recovered += 1;
                    }
                    body.stale = false;
                    body.last_error = None;
                    summary.updated += 1;
                }
                Err(error) => {
                    if !body.stale {
                        warn!("{}: {}; keeping last position", body.name, error);
                        summary.newly_stale += 1;
                    }
                    body.stale = true;
                    body.last_error = Some(error);
                    summary.failed += 1;
                }
            }
        }

        debug!(
            "Refreshed {} bodies at t={:.1} ({} failed)",
            summary.updated + summary.failed,
            simulated_time,
            summary.failed
        );
        summary
    }
}
