//! Shared constants, units and time conversions.
//!
//! Simulated time throughout the crate is `f64` seconds since the J2000 epoch.

use bevy::math::DVec3;

/// Position in render space (display units, Y up).
pub type RenderPosition = DVec3;

/// Degrees to radians conversion factor
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians to degrees conversion factor
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Seconds per day
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Minutes per day (TLE mean motion is given in revolutions per day)
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Seconds per Julian year
pub const SECONDS_PER_JULIAN_YEAR: f64 = 365.25 * SECONDS_PER_DAY;

/// J2000.0 epoch as Unix timestamp (January 1, 2000, 12:00 TT)
/// Note: This is approximate; TT differs from UTC by leap seconds
pub const J2000_UNIX: i64 = 946728000;

/// WGS-72 equatorial radius in km (the ellipsoid SGP4 is defined against).
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.135;

/// WGS-72 flattening.
pub const EARTH_FLATTENING: f64 = 1.0 / 298.26;

/// Orbital period above which SGP4 switches to the deep-space (SDP4) terms.
pub const DEEP_SPACE_PERIOD_MINUTES: f64 = 225.0;

/// Convert Unix timestamp to seconds since J2000 epoch
pub fn unix_to_j2000_seconds(unix_timestamp: i64) -> f64 {
    (unix_timestamp - J2000_UNIX) as f64
}

/// Convert J2000 seconds to Unix timestamp
pub fn j2000_seconds_to_unix(j2000_seconds: f64) -> i64 {
    J2000_UNIX + j2000_seconds.floor() as i64
}

/// Current wall-clock time as J2000 seconds.
///
/// A system clock set before 1970 yields the Unix epoch.
pub fn current_j2000_seconds() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let unix_now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    unix_now - J2000_UNIX as f64
}

/// Format J2000 seconds as a human-readable date string.
/// Returns format: "YYYY-MM-DD HH:MM:SS UTC"
///
/// Leap seconds are ignored, which is fine for a clock readout.
pub fn j2000_seconds_to_date_string(j2000_seconds: f64) -> String {
    let unix_secs = j2000_seconds_to_unix(j2000_seconds);

    let days_since_epoch = unix_secs.div_euclid(86400);
    let time_of_day = unix_secs.rem_euclid(86400);

    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let (year, month, day) = days_to_ymd(days_since_epoch);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year, month, day, hours, minutes, seconds
    )
}

/// Convert days since Unix epoch to year, month, day (proleptic Gregorian).
fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    let shifted = days + 719468; // Days from 0000-03-01 to 1970-01-01

    let era = shifted.div_euclid(146097);
    let day_of_era = (shifted - era * 146097) as u32;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36524 - day_of_era / 146096) / 365;
    let year = (year_of_era as i64 + era * 400) as i32;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };

    (year, month, day)
}
