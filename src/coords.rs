//! Vendor angle units to WGS-84 decimal degrees.

use std::f64::consts::PI;

/// Angle unit a vendor reports station coordinates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

/// Converts a raw `(lat, lon)` pair into decimal degrees.
///
/// Values are not clamped: out-of-range input comes back out of range and is
/// left for the consumer to judge.
pub fn normalize_coordinates(raw_lat: f64, raw_lon: f64, unit: AngleUnit) -> (f64, f64) {
    match unit {
        AngleUnit::Radians => (raw_lat * (180.0 / PI), raw_lon * (180.0 / PI)),
        AngleUnit::Degrees => (raw_lat, raw_lon),
    }
}
