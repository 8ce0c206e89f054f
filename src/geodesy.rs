//! Geodesy helpers: great-circle distances and spherical centroids.
//!
//! Uses a spherical Earth, which is well inside the error of any IP
//! geolocation source.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Degrees to radians conversion factor
const DTOR: f64 = PI / 180.0;

/// Radians to degrees conversion factor
const RTOD: f64 = 180.0 / PI;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90..=90)
    pub lat: f64,
    /// Longitude in degrees (-180..=180)
    pub lon: f64,
}

impl Coordinate {
    /// Builds a coordinate without validation.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Validates a coordinate reported by a provider.
    ///
    /// Rejects non-finite values, values outside the valid ranges, and the
    /// exact `(0, 0)` placeholder several providers return when they have no
    /// data for an address.
    pub fn checked(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        if lat == 0.0 && lon == 0.0 {
            return None;
        }
        Some(Self { lat, lon })
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self.lat, self.lon, other.lat, other.lon)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        self.distance_km(other) * 1000.0
    }

    fn to_unit_vector(self) -> (f64, f64, f64) {
        let lat = self.lat * DTOR;
        let lon = self.lon * DTOR;
        (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }
}

/// Haversine great-circle distance in kilometers.
///
/// Numerically stable for the short distances that dominate clustering,
/// unlike the spherical law of cosines.
pub fn haversine_km(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let dlat = (lat1 - lat0) * DTOR;
    let dlon = (lon1 - lon0) * DTOR;
    let a = (dlat / 2.0).sin().powi(2)
        + (lat0 * DTOR).cos() * (lat1 * DTOR).cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Weighted centroid of points on the sphere.
///
/// Averages unit vectors rather than raw degrees so clusters straddling the
/// antimeridian stay in place. Returns `None` when there are no points, the
/// total weight is not positive, or the weighted vectors cancel out.
pub fn weighted_centroid(points: &[(Coordinate, f64)]) -> Option<Coordinate> {
    let total: f64 = points.iter().map(|(_, w)| w.max(0.0)).sum();
    if points.is_empty() || total <= 0.0 {
        return None;
    }

    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for (coord, weight) in points {
        let w = weight.max(0.0);
        let (vx, vy, vz) = coord.to_unit_vector();
        x += vx * w;
        y += vy * w;
        z += vz * w;
    }
    x /= total;
    y /= total;
    z /= total;

    let hyp = (x * x + y * y).sqrt();
    if hyp < 1e-12 && z.abs() < 1e-12 {
        return None;
    }

    Some(Coordinate {
        lat: z.atan2(hyp) * RTOD,
        lon: y.atan2(x) * RTOD,
    })
}

/// Unweighted centroid.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    let weighted: Vec<(Coordinate, f64)> = points.iter().map(|c| (*c, 1.0)).collect();
    weighted_centroid(&weighted)
}

/// Largest pairwise distance in kilometers (0.0 for fewer than two points).
pub fn max_pairwise_km(points: &[Coordinate]) -> f64 {
    let mut max = 0.0f64;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            max = max.max(a.distance_km(b));
        }
    }
    max
}
