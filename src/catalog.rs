//! JSON body catalogs.
//!
//! Two record shapes are accepted:
//! - element-set records `{ "name", "line1", "line2" }` (the camel-case
//!   `tleLine1`/`tleLine2` keys used by common TLE feeds are accepted too);
//! - parametric records `{ "name", "radius", "angular_speed", "phase", "inclination" }`.

use std::collections::HashSet;

use bevy::log::{info, warn};
use serde::Deserialize;

use crate::orbit::{CircularOrbit, ElementSet, OrbitError};
use crate::tle::{self, ParseReport, RejectedRecord};

/// One element set as it appears in a JSON feed.
#[derive(Debug, Clone, Deserialize)]
pub struct TleRecord {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "tleLine1", alias = "TLE_LINE1")]
    pub line1: String,
    #[serde(alias = "tleLine2", alias = "TLE_LINE2")]
    pub line2: String,
}

/// One stylised body on a circular orbit.
#[derive(Debug, Clone, Deserialize)]
pub struct ParametricRecord {
    pub name: String,
    /// Display units
    pub radius: f64,
    /// Radians per simulated second
    #[serde(alias = "angularSpeed", alias = "speed")]
    pub angular_speed: f64,
    /// Starting angle in radians
    #[serde(default, alias = "angle")]
    pub phase: f64,
    /// Radians
    #[serde(default)]
    pub inclination: f64,
}

impl ParametricRecord {
    pub fn to_orbit(&self) -> Result<CircularOrbit, OrbitError> {
        CircularOrbit::new(self.radius, self.angular_speed, self.phase, self.inclination)
    }
}

/// Parse a JSON array of [`TleRecord`]s.
pub fn parse_tle_records(json: &str) -> serde_json::Result<Vec<TleRecord>> {
    serde_json::from_str(json)
}

/// Parse a JSON array of [`ParametricRecord`]s.
pub fn parse_parametric_records(json: &str) -> serde_json::Result<Vec<ParametricRecord>> {
    serde_json::from_str(json)
}

/// Validate JSON element-set records the same way text groups are validated.
///
/// `line_number` in a rejection is the 1-based index of the record.
pub fn element_sets_from_records(records: &[TleRecord]) -> ParseReport {
    let mut report = ParseReport::default();

    for (index, record) in records.iter().enumerate() {
        match tle::parse_element_set(&record.name, &record.line1, &record.line2) {
            Ok(set) => report.element_sets.push(set),
            Err(error) => {
                warn!(
                    "Skipping TLE record #{} ({}): {}",
                    index + 1,
                    if record.name.is_empty() { "unnamed" } else { &record.name },
                    error
                );
                report.rejected.push(RejectedRecord {
                    line_number: index + 1,
                    name: (!record.name.is_empty()).then(|| record.name.clone()),
                    error,
                });
            }
        }
    }

    info!(
        "Parsed {} element sets from JSON ({} rejected)",
        report.element_sets.len(),
        report.rejected.len()
    );
    report
}

/// Keep only element sets whose NORAD id appears in `catalog`.
///
/// Used to restrict a full feed to the bodies a scene has assets for.
pub fn retain_catalog(sets: Vec<ElementSet>, catalog: &HashSet<u32>) -> Vec<ElementSet> {
    let before = sets.len();
    let kept: Vec<_> = sets
        .into_iter()
        .filter(|set| catalog.contains(&set.norad_id()))
        .collect();
    info!("Catalog filter kept {} of {} element sets", kept.len(), before);
    kept
}
