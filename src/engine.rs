//! The satellite state engine and its Bevy plugin.
//!
//! [`SatelliteEngine`] is a single resource composing the clock, the body
//! registry, the coordinate pipeline and the interaction resolver. Keeping
//! them together means refresh and selection can never run concurrently and
//! a removal is seen by the resolver in the same call.
//!
//! The engine can be driven directly (tests, tools) or through
//! [`SatelliteEnginePlugin`], which advances it from [`Time<Real>`] every
//! frame and exchanges messages with UI and input code.

use bevy::prelude::*;

use crate::catalog::{self, ParametricRecord};
use crate::frames::{CoordinatePipeline, Geodetic};
use crate::orbit::{OrbitDescriptor, OrbitError, Propagator};
use crate::registry::{Body, BodyId, BodyRegistry, BodyView, RefreshSummary, RegistryError};
use crate::selection::{InteractionResolver, PickRay, SelectionChanged};
use crate::settings::EngineSettings;
use crate::time::{ClockError, SimulationClock};
use crate::tle::{self, ParseReport, RejectedRecord, TleStream};
use crate::track;
use crate::types::{RenderPosition, current_j2000_seconds};

/// Why a body or a whole JSON document could not be loaded.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Orbit(#[from] OrbitError),
}

/// Outcome of a bulk load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub admitted: Vec<BodyId>,
    /// Records that failed TLE validation
    pub rejected: Vec<RejectedRecord>,
    /// Valid records the registry refused (duplicate names, bad parameters)
    pub refused: Vec<(String, LoadError)>,
}

/// Pointer input already converted to a render-space ray.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    Move(PickRay),
    Click(PickRay),
}

/// Request removal of a body.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveBody(pub BodyId);

/// Request a new clock rate.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct RateRequest(pub f64);

/// Programmatic selection, e.g. from a body list. `None` clears.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectRequest(pub Option<BodyId>);

#[derive(Resource, Debug)]
pub struct SatelliteEngine {
    clock: SimulationClock,
    registry: BodyRegistry,
    resolver: InteractionResolver,
    pipeline: CoordinatePipeline,
    settings: EngineSettings,
    stream: TleStream,
    outbox: Vec<SelectionChanged>,
}

impl FromWorld for SatelliteEngine {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<EngineSettings>()
            .cloned()
            .unwrap_or_default();
        Self::new(settings, current_j2000_seconds())
    }
}

impl SatelliteEngine {
    /// Engine whose clock starts at `start_time` (J2000 seconds).
    ///
    /// Out-of-range settings fall back to their defaults with a warning; an
    /// invalid `initial_rate` falls back to 1.
    pub fn new(settings: EngineSettings, start_time: f64) -> Self {
        let settings = settings.sanitized();
        let mut clock = SimulationClock::at_j2000_seconds(start_time);
        if let Err(err) = clock.set_rate(settings.initial_rate) {
            warn!("Ignoring configured initial rate: {}", err);
        }
        Self {
            clock,
            registry: BodyRegistry::new(),
            resolver: InteractionResolver::new(settings.pick_radius),
            pipeline: CoordinatePipeline::new(settings.display),
            settings,
            stream: TleStream::new(),
            outbox: Vec::new(),
        }
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Play/pause/scrub controls. Rate changes should go through
    /// [`SatelliteEngine::set_rate`].
    pub fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &InteractionResolver {
        &self.resolver
    }

    pub fn pipeline(&self) -> &CoordinatePipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn simulated_time(&self) -> f64 {
        self.clock.simulated_time()
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<(), ClockError> {
        self.clock.set_rate(rate)
    }

    /// One logical step: tick the clock, then propagate every body.
    pub fn advance(&mut self, wall_now: f64) -> RefreshSummary {
        self.clock.tick(wall_now);
        self.refresh()
    }

    /// Propagate every body at the current simulated time without ticking.
    pub fn refresh(&mut self) -> RefreshSummary {
        self.registry.refresh(self.clock.simulated_time(), &self.pipeline)
    }

    /// Admit one body.
    ///
    /// Parametric orbits are anchored so their phase refers to the current
    /// simulated time. Element sets get the configured propagation window.
    pub fn admit(
        &mut self,
        name: impl Into<String>,
        descriptor: impl Into<OrbitDescriptor>,
    ) -> Result<BodyId, RegistryError> {
        let descriptor = match descriptor.into() {
            OrbitDescriptor::Parametric(orbit) => {
                OrbitDescriptor::Parametric(orbit.with_epoch(self.clock.simulated_time()))
            }
            OrbitDescriptor::ElementSet(set) => OrbitDescriptor::ElementSet(Box::new(
                set.with_max_span_years(self.settings.max_propagation_years),
            )),
        };
        let name = name.into();
        let id = self.registry.add(name.clone(), descriptor)?;
        debug!("Admitted {} as {}", name, id);
        Ok(id)
    }

    fn admit_parsed(&mut self, parsed: ParseReport) -> LoadReport {
        let mut report = LoadReport {
            rejected: parsed.rejected,
            ..default()
        };
        for set in parsed.element_sets {
            let name = set.name().to_string();
            match self.admit(name.clone(), set) {
                Ok(id) => report.admitted.push(id),
                Err(err) => {
                    warn!("Not admitting {}: {}", name, err);
                    report.refused.push((name, err.into()));
                }
            }
        }
        report
    }

    /// Load a three-line TLE document.
    pub fn load_tle_text(&mut self, text: &str) -> LoadReport {
        let report = self.admit_parsed(tle::parse_tle_batch(text));
        info!(
            "Loaded {} bodies from TLE text ({} rejected, {} refused)",
            report.admitted.len(),
            report.rejected.len(),
            report.refused.len()
        );
        report
    }

    /// Load a JSON array of `{name, line1, line2}` records.
    pub fn load_tle_json(&mut self, json: &str) -> Result<LoadReport, LoadError> {
        let records = catalog::parse_tle_records(json)?;
        Ok(self.admit_parsed(catalog::element_sets_from_records(&records)))
    }

    /// Load a JSON array of parametric orbit records.
    pub fn load_parametric_json(&mut self, json: &str) -> Result<LoadReport, LoadError> {
        let records = catalog::parse_parametric_records(json)?;
        Ok(self.admit_parametric(&records))
    }

    pub fn admit_parametric(&mut self, records: &[ParametricRecord]) -> LoadReport {
        let mut report = LoadReport::default();
        for record in records {
            let admitted = record
                .to_orbit()
                .map_err(LoadError::from)
                .and_then(|orbit| Ok(self.admit(record.name.clone(), orbit)?));
            match admitted {
                Ok(id) => report.admitted.push(id),
                Err(err) => {
                    warn!("Not admitting {}: {}", record.name, err);
                    report.refused.push((record.name.clone(), err));
                }
            }
        }
        info!(
            "Loaded {} parametric bodies ({} refused)",
            report.admitted.len(),
            report.refused.len()
        );
        report
    }

    /// Feed one line of a TLE stream. A completed group is admitted at once.
    pub fn push_tle_line(&mut self, line: &str) -> Option<Result<BodyId, LoadError>> {
        match self.stream.push_line(line)? {
            Ok(set) => {
                let name = set.name().to_string();
                Some(self.admit(name, set).map_err(LoadError::from))
            }
            Err(rejected) => {
                warn!(
                    "Skipping streamed TLE group at line {}: {}",
                    rejected.line_number, rejected.error
                );
                None
            }
        }
    }

    /// End the current TLE stream, reporting a truncated trailing group.
    pub fn finish_tle_stream(&mut self) -> Option<RejectedRecord> {
        let rejected = self.stream.finish();
        if let Some(rejected) = &rejected {
            warn!("TLE stream ended mid-group at line {}", rejected.line_number);
        }
        self.stream = TleStream::new();
        rejected
    }

    /// Remove a body; a selection on it is cleared in the same call.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let body = self.registry.remove(id)?;
        if let Some(change) = self.resolver.body_removed(id) {
            self.outbox.push(change);
        }
        info!("Removed {}", body.name());
        Some(body)
    }

    pub fn pointer_move(&mut self, ray: &PickRay) {
        self.resolver.pointer_move(ray, &self.registry);
    }

    pub fn pointer_click(&mut self, ray: &PickRay) -> Option<SelectionChanged> {
        let change = self.resolver.pointer_click(ray, &mut self.registry);
        self.outbox.extend(change);
        change
    }

    pub fn select(&mut self, id: BodyId) -> Option<SelectionChanged> {
        let change = self.resolver.select(id, &mut self.registry);
        self.outbox.extend(change);
        change
    }

    pub fn clear_selection(&mut self) -> Option<SelectionChanged> {
        let change = self.resolver.clear(&mut self.registry);
        self.outbox.extend(change);
        change
    }

    pub fn selected(&self) -> Option<BodyId> {
        self.resolver.selected()
    }

    pub fn hovered(&self) -> Option<BodyId> {
        self.resolver.hovered()
    }

    /// Selection changes since the last drain, oldest first.
    pub fn drain_selection_changes(&mut self) -> Vec<SelectionChanged> {
        std::mem::take(&mut self.outbox)
    }

    /// Bodies with a valid position, for the renderer.
    pub fn frame(&self) -> impl Iterator<Item = BodyView<'_>> {
        self.registry.frame()
    }

    /// One period of a body's orbit starting now.
    pub fn orbit_track(&self, id: BodyId) -> Option<Vec<RenderPosition>> {
        let body = self.registry.get(id)?;
        Some(track::orbit_track(
            body.descriptor(),
            self.clock.simulated_time(),
            &self.pipeline,
            self.settings.track_samples,
        ))
    }

    /// Current latitude/longitude/altitude of an element-set body.
    pub fn geodetic(&self, id: BodyId) -> Option<Geodetic> {
        let body = self.registry.get(id)?;
        let t = self.clock.simulated_time();
        let sample = body.descriptor().evaluate(t).ok()?;
        self.pipeline.geodetic(&sample, t)
    }

    /// Earth rotation angle about render-space Y at the current time.
    pub fn central_body_rotation(&self) -> f64 {
        self.pipeline.central_body_rotation(self.clock.simulated_time())
    }
}

/// Systems of [`SatelliteEnginePlugin`], in execution order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SatelliteEngineSet;

/// Drives [`SatelliteEngine`] once per frame.
///
/// Insert an [`EngineSettings`] resource before adding the plugin to
/// override the defaults.
pub struct SatelliteEnginePlugin;

impl Plugin for SatelliteEnginePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SatelliteEngine>()
            .add_message::<PointerInput>()
            .add_message::<RemoveBody>()
            .add_message::<RateRequest>()
            .add_message::<SelectRequest>()
            .add_message::<SelectionChanged>()
            .add_systems(
                Update,
                (
                    apply_rate_requests,
                    advance_engine,
                    apply_removals,
                    apply_pointer_input,
                    publish_selection_changes,
                )
                    .chain()
                    .in_set(SatelliteEngineSet),
            );
    }
}

fn apply_rate_requests(mut requests: MessageReader<RateRequest>, mut engine: ResMut<SatelliteEngine>) {
    for RateRequest(rate) in requests.read() {
        if let Err(err) = engine.set_rate(*rate) {
            warn!("Rate request rejected: {}", err);
        }
    }
}

/// Wall time comes from [`Time<Real>`], which is not clamped like virtual time.
fn advance_engine(time: Res<Time<Real>>, mut engine: ResMut<SatelliteEngine>) {
    engine.advance(time.elapsed_secs_f64());
}

fn apply_removals(mut requests: MessageReader<RemoveBody>, mut engine: ResMut<SatelliteEngine>) {
    for RemoveBody(id) in requests.read() {
        engine.remove_body(*id);
    }
}

fn apply_pointer_input(
    mut pointer: MessageReader<PointerInput>,
    mut selections: MessageReader<SelectRequest>,
    mut engine: ResMut<SatelliteEngine>,
) {
    for input in pointer.read() {
        match input {
            PointerInput::Move(ray) => engine.pointer_move(ray),
            PointerInput::Click(ray) => {
                engine.pointer_click(ray);
            }
        }
    }
    for SelectRequest(target) in selections.read() {
        match target {
            Some(id) => engine.select(*id),
            None => engine.clear_selection(),
        };
    }
}

fn publish_selection_changes(
    mut engine: ResMut<SatelliteEngine>,
    mut changes: MessageWriter<SelectionChanged>,
) {
    for change in engine.drain_selection_changes() {
        changes.write(change);
    }
}
