//! Geographic helpers.
//!
//! All coordinates use WGS84 (lat/lon in degrees). Used to match
//! geocoding results back to the directions that produced them.

use serde::{Deserialize, Serialize};

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Point { lat, lon }
    }

    /// True if `other` lies within `tolerance_m` meters of this point.
    ///
    /// A tolerance of zero (or less) requires exact equality.
    pub fn matches(&self, other: &Point, tolerance_m: f64) -> bool {
        if tolerance_m <= 0.0 {
            return self.lat == other.lat && self.lon == other.lon;
        }
        haversine(self, other) <= tolerance_m
    }

    /// Render as `"lat, lon"` with at most 4 fractional digits each.
    pub fn to_short_string(&self) -> String {
        format!("{}, {}", short_decimal(self.lat), short_decimal(self.lon))
    }
}

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two points in meters.
pub fn haversine(a: &Point, b: &Point) -> f64 {
    let (phi1, phi2) = (a.lat.to_radians(), b.lat.to_radians());
    let half_dphi = (phi2 - phi1) / 2.0;
    let half_dlambda = (b.lon - a.lon).to_radians() / 2.0;

    let h = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

fn short_decimal(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
