use crate::model::geofence::{Coordinate, Geofence};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const DEFAULT_RADIUS_METERS: f64 = 50.0;

/// Geofence hit with the measured distance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceMatch {
    pub geofence_id: u64,
    pub name: String,
    pub distance_m: f64,
}

/// Great-circle distance in meters (haversine).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// First geofence (in slice order) whose radius contains `point`.
///
/// Geofences without a full center coordinate are skipped. This is not a
/// nearest-match search: callers order the slice by priority.
pub fn find_valid_geofence(point: Coordinate, geofences: &[Geofence]) -> Option<GeofenceMatch> {
    geofences.iter().find_map(|g| {
        let center = g.center()?;
        let distance = distance_meters(point, center);
        let radius = g.radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);

        (distance <= radius).then(|| GeofenceMatch {
            geofence_id: g.id,
            name: g.name.clone(),
            distance_m: (distance * 100.0).round() / 100.0,
        })
    })
}
