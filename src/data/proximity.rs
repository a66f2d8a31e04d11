//! Great-circle proximity of detections to the target locations.

use geo::{Distance, Geodesic, Point};

use super::model::TargetPoint;

/// Default proximity radius in kilometres.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

fn valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}

/// Geodesic (WGS-84 ellipsoid) distance in kilometres between two
/// `(lat, lon)` pairs. `None` when either coordinate is out of range.
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> Option<f64> {
    if !valid_coordinate(from.0, from.1) || !valid_coordinate(to.0, to.1) {
        return None;
    }
    let a = Point::new(from.1, from.0);
    let b = Point::new(to.1, to.0);
    let meters: f64 = Geodesic.distance(a, b);
    meters.is_finite().then(|| meters.abs() / 1000.0)
}

/// Distance to the closest target, or `None` for an invalid point or an
/// empty target list.
pub fn nearest_target_km(lat: f64, lon: f64, targets: &[TargetPoint]) -> Option<f64> {
    targets
        .iter()
        .filter_map(|t| distance_km((lat, lon), (t.latitude, t.longitude)))
        .min_by(f64::total_cmp)
}

/// Whether `(lat, lon)` lies within `max_distance_km` of any target.
///
/// Invalid coordinates (NaN, |lat| > 90, ...) are never near anything.
pub fn is_near(lat: f64, lon: f64, targets: &[TargetPoint], max_distance_km: f64) -> bool {
    if max_distance_km.is_nan() {
        return false;
    }
    targets.iter().any(|t| {
        distance_km((lat, lon), (t.latitude, t.longitude))
            .is_some_and(|d| d <= max_distance_km)
    })
}
