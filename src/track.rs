//! Orbit track sampling.
//!
//! A track is one orbital period of render-space points starting at a given
//! time. For element sets the sidereal angle is frozen at the start so the
//! drawn line is the orbit as seen at that instant rather than a ground track.

use crate::frames::{CoordinatePipeline, greenwich_sidereal_angle};
use crate::orbit::{FrameKind, OrbitDescriptor, Propagator};
use crate::types::RenderPosition;

/// Step between element-set track samples in seconds.
pub const ELEMENT_SET_TRACK_STEP: f64 = 60.0;

/// Segments per parametric orbit track.
pub const PARAMETRIC_TRACK_SEGMENTS: usize = 100;

/// Sample one period of `descriptor` starting at `start_time`.
///
/// At most `max_samples` points are produced; the step is widened if the
/// period needs more. Samples that fail to propagate are skipped. A body with
/// no period (a stationary parametric orbit) yields an empty track.
pub fn orbit_track(
    descriptor: &OrbitDescriptor,
    start_time: f64,
    pipeline: &CoordinatePipeline,
    max_samples: usize,
) -> Vec<RenderPosition> {
    let Some(period) = descriptor.period().filter(|p| p.is_finite() && *p > 0.0) else {
        return Vec::new();
    };
    if max_samples < 2 {
        return Vec::new();
    }

    let segments = match descriptor {
        OrbitDescriptor::Parametric(_) => PARAMETRIC_TRACK_SEGMENTS,
        OrbitDescriptor::ElementSet(_) => (period / ELEMENT_SET_TRACK_STEP).ceil() as usize,
    }
    .clamp(1, max_samples - 1);
    let step = period / segments as f64;
    let gmst = greenwich_sidereal_angle(start_time);

    (0..=segments)
        .filter_map(|i| {
            let sample = descriptor.evaluate(start_time + i as f64 * step).ok()?;
            Some(match sample.frame {
                FrameKind::OrbitPlane => pipeline.to_render_space(&sample, start_time),
                FrameKind::Eci => pipeline.eci_to_render(sample.position, gmst),
            })
        })
        .collect()
}
