//! Test utilities shared by unit tests.
//!
//! Provides element-set fixtures with valid checksums, assertions on
//! selection invariants, and a headless Bevy app.

/// Known-good element sets.
pub mod fixtures {
    use crate::orbit::ElementSet;

    /// Low Earth orbit, near-earth regime.
    pub const ISS_NAME: &str = "ISS (ZARYA)";
    pub const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    pub const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    /// Geostationary, deep-space regime.
    pub const GEO_NAME: &str = "GEO TEST SAT";
    pub const GEO_LINE1: &str =
        "1 28884U 05041A   24001.50000000 -.00000100  00000-0  00000+0 0  9993";
    pub const GEO_LINE2: &str =
        "2 28884   0.0500  90.0000 0002000 270.0000  45.0000  1.00271000 67897";

    /// Sun-synchronous, nearly polar.
    pub const SSO_NAME: &str = "SSO TEST SAT";
    pub const SSO_LINE1: &str =
        "1 43013U 17073A   24015.25000000  .00000512  00000-0  24512-4 0  9994";
    pub const SSO_LINE2: &str =
        "2 43013  98.7412 120.5531 0001245  95.3314 264.9001 14.19543210321006";

    pub fn iss_element_set() -> ElementSet {
        ElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).expect("ISS fixture parses")
    }

    pub fn geo_element_set() -> ElementSet {
        ElementSet::from_lines(GEO_NAME, GEO_LINE1, GEO_LINE2).expect("GEO fixture parses")
    }

    pub fn sso_element_set() -> ElementSet {
        ElementSet::from_lines(SSO_NAME, SSO_LINE1, SSO_LINE2).expect("SSO fixture parses")
    }

    /// Copy of an element line with its checksum digit changed.
    pub fn with_wrong_checksum(line: &str) -> String {
        let (body, digit) = line.split_at(line.len() - 1);
        let wrong = match digit {
            "9" => '0',
            d => (d.as_bytes()[0] + 1) as char,
        };
        format!("{}{}", body, wrong)
    }
}

/// Assertions on engine invariants.
pub mod assertions {
    use crate::registry::BodyRegistry;

    /// At most one body carries the selected flag.
    pub fn assert_exclusive_selection(registry: &BodyRegistry) {
        let selected = registry.iter().filter(|body| body.is_selected()).count();
        assert!(selected <= 1, "{} bodies selected at once", selected);
    }
}

/// Utilities for creating headless Bevy apps for testing.
pub mod bevy_test {
    use bevy::prelude::*;

    /// Create a minimal Bevy app for testing without rendering.
    pub fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tle::checksum;

    #[test]
    fn test_fixture_checksums() {
        for line in [
            fixtures::ISS_LINE1,
            fixtures::ISS_LINE2,
            fixtures::GEO_LINE1,
            fixtures::GEO_LINE2,
            fixtures::SSO_LINE1,
            fixtures::SSO_LINE2,
        ] {
            let digit = line.chars().last().and_then(|c| c.to_digit(10)).unwrap();
            assert_eq!(checksum(line), digit, "{}", line);
        }
    }

    #[test]
    fn test_wrong_checksum_changes_only_last_digit() {
        let broken = fixtures::with_wrong_checksum(fixtures::ISS_LINE1);
        assert_eq!(broken.len(), fixtures::ISS_LINE1.len());
        assert_ne!(broken, fixtures::ISS_LINE1);
        assert_eq!(&broken[..68], &fixtures::ISS_LINE1[..68]);
        assert!(broken.ends_with('8'));
    }

    #[test]
    fn test_headless_app_updates() {
        let mut app = bevy_test::headless_app();
        app.update();
    }
}
