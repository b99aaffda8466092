//! Route geometry: the area between a start and an end point.
//!
//! The safety lookup queries a circle centred on the midpoint of the two
//! endpoints that is just large enough to contain both.

use geo::{Distance, Haversine, Point};
use safe_travels_geo_models::LngLat;

/// Smallest search radius accepted by the safety provider, in km.
pub const MIN_RADIUS_KM: u32 = 1;

/// Largest search radius accepted by the safety provider, in km.
pub const MAX_RADIUS_KM: u32 = 20;

/// The area searched for safety records along a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteArea {
    /// Midpoint of the two endpoints.
    pub center: LngLat,
    /// Search radius in whole kilometres, clamped to the provider's range.
    pub radius_km: u32,
}

/// Arithmetic midpoint of two coordinates.
///
/// Adequate at city scale; it does not handle routes crossing the
/// antimeridian.
#[must_use]
pub fn midpoint(a: LngLat, b: LngLat) -> LngLat {
    LngLat::new(
        f64::midpoint(a.longitude, b.longitude),
        f64::midpoint(a.latitude, b.latitude),
    )
}

/// Great-circle distance between two coordinates in kilometres.
#[must_use]
pub fn haversine_km(a: LngLat, b: LngLat) -> f64 {
    let from = Point::new(a.longitude, a.latitude);
    let to = Point::new(b.longitude, b.latitude);
    Haversine.distance(from, to) / 1000.0
}

/// Computes the search area for a route from `start` to `end`.
#[must_use]
pub fn route_area(start: LngLat, end: LngLat) -> RouteArea {
    let center = midpoint(start, end);
    let reach = haversine_km(center, start).max(haversine_km(center, end));

    RouteArea {
        center,
        radius_km: clamp_radius(reach),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_radius(km: f64) -> u32 {
    let rounded = km.ceil();
    if rounded.is_nan() || rounded <= f64::from(MIN_RADIUS_KM) {
        MIN_RADIUS_KM
    } else if rounded >= f64::from(MAX_RADIUS_KM) {
        MAX_RADIUS_KM
    } else {
        rounded as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_averages_each_axis() {
        let mid = midpoint(LngLat::new(-71.0, 41.0), LngLat::new(-72.0, 42.0));
        assert!((mid.longitude - -71.5).abs() < 1e-12);
        assert!((mid.latitude - 41.5).abs() < 1e-12);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Providence City Hall to Boston City Hall is roughly 66 km.
        let providence = LngLat::new(-71.4128, 41.8240);
        let boston = LngLat::new(-71.0589, 42.3601);
        let km = haversine_km(providence, boston);
        assert!((km - 66.5).abs() < 2.0, "got {km}");
    }

    #[test]
    fn radius_rounds_up_to_whole_kilometres() {
        // ~5.6 km apart, so ~2.8 km from the midpoint.
        let area = route_area(LngLat::new(-71.4128, 41.8240), LngLat::new(-71.4128, 41.8740));
        assert_eq!(area.radius_km, 3);
        assert!((area.center.latitude - 41.849).abs() < 1e-9);
    }

    #[test]
    fn radius_is_clamped_to_provider_range() {
        let same = LngLat::new(-71.4, 41.8);
        assert_eq!(route_area(same, same).radius_km, MIN_RADIUS_KM);

        let far = route_area(LngLat::new(-71.4, 41.8), LngLat::new(-74.0, 40.7));
        assert_eq!(far.radius_km, MAX_RADIUS_KM);
    }
}
