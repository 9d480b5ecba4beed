/*!
 * Geographic calculations.
 *
 * These are simple spherical Earth calculations. At the scale of a town or a city the error from
 * treating the Earth as a sphere is far smaller than the error in the business locations
 * themselves.
 */

use crate::SiteError;
use std::fmt::{self, Display};

const DEG2RAD: f64 = 2.0 * std::f64::consts::PI / 360.0;
const RAD2DEG: f64 = 360.0 / (2.0 * std::f64::consts::PI);
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude-longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point, checking that it lies in the valid latitude and longitude ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, SiteError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(SiteError::InvalidInput(format!(
                "latitude {} out of range [-90, 90]",
                lat
            )));
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(SiteError::InvalidInput(format!(
                "longitude {} out of range [-180, 180]",
                lon
            )));
        }

        Ok(GeoPoint { lat, lon })
    }

    /// Test whether two points are within eps degrees of each other in both directions.
    pub fn is_close(&self, other: GeoPoint, eps: f64) -> bool {
        (self.lat - other.lat).abs() < eps && (self.lon - other.lon).abs() < eps
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Anything that sits at a single location on the Earth.
pub trait Geo {
    fn location(&self) -> GeoPoint;
}

impl Geo for GeoPoint {
    fn location(&self) -> GeoPoint {
        *self
    }
}

impl<T: Geo> Geo for &T {
    fn location(&self) -> GeoPoint {
        (*self).location()
    }
}

/**
 * The great circle distance between two points using the haversine formula.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_r = a.lat * DEG2RAD;
    let lon1_r = a.lon * DEG2RAD;
    let lat2_r = b.lat * DEG2RAD;
    let lon2_r = b.lon * DEG2RAD;

    let dlat2 = (lat2_r - lat1_r) / 2.0;
    let dlon2 = (lon2_r - lon1_r) / 2.0;

    let sin2_dlat = f64::powi(f64::sin(dlat2), 2);
    let sin2_dlon = f64::powi(f64::sin(dlon2), 2);

    // Rounding can push this a hair above 1 for antipodal points.
    let h = (sin2_dlat + sin2_dlon * f64::cos(lat1_r) * f64::cos(lat2_r)).min(1.0);

    2.0 * f64::asin(f64::sqrt(h)) * EARTH_RADIUS_KM
}

/**
 * The geographic mean of a group of points.
 *
 * Each point is converted to a unit vector, the vectors are averaged, and the mean vector is
 * converted back to a latitude and longitude. Unlike averaging the coordinates directly this
 * behaves near the poles and across the antimeridian.
 *
 * A single point is returned unchanged. An empty list is an error.
 */
pub fn spherical_centroid<T: Geo>(points: &[T]) -> Result<GeoPoint, SiteError> {
    match points {
        [] => Err(SiteError::InvalidInput(
            "cannot calculate the centroid of zero points".to_owned(),
        )),
        [single] => Ok(single.location()),
        _ => {
            let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
            for pnt in points.iter().map(|p| p.location()) {
                let lat_r = pnt.lat * DEG2RAD;
                let lon_r = pnt.lon * DEG2RAD;

                x += lat_r.cos() * lon_r.cos();
                y += lat_r.cos() * lon_r.sin();
                z += lat_r.sin();
            }

            let total = points.len() as f64;
            x /= total;
            y /= total;
            z /= total;

            let lon = f64::atan2(y, x) * RAD2DEG;
            let lat = f64::atan2(z, f64::hypot(x, y)) * RAD2DEG;

            Ok(GeoPoint { lat, lon })
        }
    }
}

/// Count the points within radius_km of center, including those exactly on the boundary.
pub fn count_within_radius<T: Geo>(center: GeoPoint, points: &[T], radius_km: f64) -> usize {
    points
        .iter()
        .filter(|p| distance_km(center, p.location()) <= radius_km)
        .count()
}

/**
 * Find the candidate closest to location.
 *
 * Ties go to the candidate that comes first in the slice.
 *
 * #Returns
 * The closest candidate and its distance in kilometers, or `None` if there are no candidates.
 */
pub fn nearest<T: Geo>(location: GeoPoint, candidates: &[T]) -> Option<(&T, f64)> {
    let mut best: Option<(&T, f64)> = None;

    for candidate in candidates {
        let dist = distance_km(location, candidate.location());
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((candidate, dist)),
        }
    }

    best
}

/// All the points within radius_km of center, paired with their distance and sorted closest
/// first. Points at equal distances keep their relative order.
pub fn within_radius_sorted<T: Geo>(
    center: GeoPoint,
    points: &[T],
    radius_km: f64,
) -> Vec<(&T, f64)> {
    let mut found: Vec<(&T, f64)> = points
        .iter()
        .map(|p| (p, distance_km(center, p.location())))
        .filter(|(_, dist)| *dist <= radius_km)
        .collect();

    found.sort_by(|a, b| a.1.total_cmp(&b.1));

    found
}
