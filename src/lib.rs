//! Satscope - Satellite State Engine
//!
//! Propagates orbiting bodies from TLE element sets (SGP4/SDP4) or parametric
//! circular orbits, advances a rate-controlled simulation clock, and resolves
//! pointer selection against the resulting render-space positions.

pub mod catalog;
pub mod engine;
pub mod frames;
pub mod orbit;
pub mod registry;
pub mod selection;
pub mod settings;
pub mod time;
pub mod tle;
pub mod track;
pub mod types;

#[cfg(test)]
pub mod test_utils;
