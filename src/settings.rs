//! Engine configuration.
//!
//! Defaults reproduce the classic globe view: a 3-unit Earth with one display
//! unit per 1000 km of altitude. Settings can be loaded from JSON; missing
//! keys keep their defaults and out-of-range values are rejected.

use bevy::prelude::*;
use serde::Deserialize;

use crate::orbit::element_set::DEFAULT_MAX_SPAN_YEARS;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

fn check_positive(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NotPositive { field, value })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Negative { field, value })
    }
}

/// Keep `value` if `check` passed, otherwise warn and use `default`.
fn or_default(check: Result<(), SettingsError>, value: f64, default: f64) -> f64 {
    match check {
        Ok(()) => value,
        Err(err) => {
            warn!("{}; using {}", err, default);
            default
        }
    }
}

/// Altitude-to-radius mapping of the display sphere.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayScale {
    /// Render radius of the central body's surface
    pub base_radius: f64,
    /// Kilometres of altitude per render unit
    pub km_per_unit: f64,
    /// Multiplier applied to parametric (already render-space) orbits
    pub parametric_scale: f64,
}

impl Default for DisplayScale {
    fn default() -> Self {
        Self {
            base_radius: 3.0,
            km_per_unit: 1000.0,
            parametric_scale: 1.0,
        }
    }
}

impl DisplayScale {
    /// Display sphere radius for a body at `altitude_km`.
    pub fn display_radius(&self, altitude_km: f64) -> f64 {
        self.base_radius + altitude_km / self.km_per_unit
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check_positive("display.base_radius", self.base_radius)?;
        check_positive("display.km_per_unit", self.km_per_unit)?;
        check_positive("display.parametric_scale", self.parametric_scale)
    }
}

/// Tunables for [`crate::engine::SatelliteEngine`].
#[derive(Resource, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub display: DisplayScale,
    /// Radius of the hit-test sphere around each body (render units).
    /// Large enough to enclose the body marker and its label.
    pub pick_radius: f64,
    /// Element sets are not propagated further than this from their epoch.
    pub max_propagation_years: f64,
    /// Clock rate at start-up
    pub initial_rate: f64,
    /// Upper bound on points per orbit track
    pub track_samples: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            display: DisplayScale::default(),
            pick_radius: 0.25,
            max_propagation_years: DEFAULT_MAX_SPAN_YEARS,
            initial_rate: 1.0,
            track_samples: 360,
        }
    }
}

impl EngineSettings {
    /// Parse and validate settings from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.display.validate()?;
        check_positive("pick_radius", self.pick_radius)?;
        check_non_negative("max_propagation_years", self.max_propagation_years)
    }

    /// Copy with every out-of-range value replaced by its default, warning
    /// once per replaced value. `initial_rate` is left to the clock.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let display = DisplayScale {
            base_radius: or_default(
                check_positive("display.base_radius", self.display.base_radius),
                self.display.base_radius,
                defaults.display.base_radius,
            ),
            km_per_unit: or_default(
                check_positive("display.km_per_unit", self.display.km_per_unit),
                self.display.km_per_unit,
                defaults.display.km_per_unit,
            ),
            parametric_scale: or_default(
                check_positive("display.parametric_scale", self.display.parametric_scale),
                self.display.parametric_scale,
                defaults.display.parametric_scale,
            ),
        };
        Self {
            display,
            pick_radius: or_default(
                check_positive("pick_radius", self.pick_radius),
                self.pick_radius,
                defaults.pick_radius,
            ),
            max_propagation_years: or_default(
                check_non_negative("max_propagation_years", self.max_propagation_years),
                self.max_propagation_years,
                defaults.max_propagation_years,
            ),
            ..self
        }
    }
}
