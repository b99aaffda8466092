#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic value types shared by the SafeTravels server and client.
//!
//! These are the plain data shapes that flow between the backend, the
//! external providers, and the map session: coordinate pairs, bounding
//! boxes, the map camera, user-reported hazards, and per-neighborhood
//! safety records. They carry no behaviour beyond simple accessors; the
//! matching and filtering logic lives in `safe_travels_geo`.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair in `GeoJSON` order (longitude first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl LngLat {
    /// Creates a coordinate pair from a longitude and latitude.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Returns the `[longitude, latitude]` position used by `GeoJSON`.
    #[must_use]
    pub fn to_position(self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }

    /// Builds a coordinate from a `GeoJSON` position slice.
    ///
    /// Returns `None` if the slice has fewer than two elements.
    #[must_use]
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lon, *lat)),
            _ => None,
        }
    }
}

/// A latitude/longitude bounding box. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub min_lat: f64,
    /// Northern latitude boundary.
    pub max_lat: f64,
    /// Western longitude boundary.
    pub min_lon: f64,
    /// Eastern longitude boundary.
    pub max_lon: f64,
}

impl BoundingBox {
    /// The whole globe. This is the initial filter of the redlining overlay.
    pub const WORLD: Self = Self::new(-90.0, 90.0, -180.0, 180.0);

    /// Creates a new bounding box from the given bounds.
    #[must_use]
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Whether `point` lies inside or on the edge of this box.
    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// The map camera: what the user is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Longitude of the view centre.
    pub longitude: f64,
    /// Latitude of the view centre.
    pub latitude: f64,
    /// Zoom level.
    pub zoom: f64,
}

impl ViewState {
    /// Zoom level of a freshly opened map.
    pub const INITIAL_ZOOM: f64 = 10.0;

    /// Zoom level used when flying to a search result.
    pub const SEARCH_ZOOM: f64 = 12.0;

    /// Returns the centre of the view.
    #[must_use]
    pub const fn center(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    /// Returns a view centred on `target` at `zoom`.
    #[must_use]
    pub const fn fly_to(target: LngLat, zoom: f64) -> Self {
        Self {
            longitude: target.longitude,
            latitude: target.latitude,
            zoom,
        }
    }
}

impl Default for ViewState {
    /// Providence, RI.
    fn default() -> Self {
        Self {
            longitude: -71.4025,
            latitude: 41.8268,
            zoom: Self::INITIAL_ZOOM,
        }
    }
}

/// A user-reported hazard pinned to a map location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardMarker {
    /// Where the hazard was reported.
    pub location: LngLat,
    /// Free-text description of the hazard.
    pub title: String,
}

/// Latitude/longitude of a safety record, as named by the safety provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCode {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<GeoCode> for LngLat {
    fn from(value: GeoCode) -> Self {
        Self::new(value.longitude, value.latitude)
    }
}

/// The seven safety sub-scores of a neighborhood (1 = safest, 100 = least
/// safe).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyScores {
    /// Likelihood of harm or discrimination against LGBTQ+ travelers.
    pub lgbtq: u8,
    /// Availability and quality of medical services.
    pub medical: u8,
    /// Overall safety score.
    pub overall: u8,
    /// Likelihood of injury due to crime.
    pub physical_harm: u8,
    /// Potential for infringement of political rights.
    pub political_freedom: u8,
    /// Likelihood of theft.
    pub theft: u8,
    /// Likelihood of harassment or assault against women.
    pub women: u8,
}

/// A neighborhood safety record, rendered on the map as a safety pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRecord {
    /// Provider-assigned identifier.
    pub id: String,
    /// Display name (usually the neighborhood name).
    pub name: String,
    /// Location of the record.
    pub geo_code: GeoCode,
    /// Safety sub-scores.
    pub safety_scores: SafetyScores,
    /// Granularity of the record (`"CITY"`, `"DISTRICT"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
}

impl SafetyRecord {
    /// Returns the record's location as a coordinate pair.
    #[must_use]
    pub fn location(&self) -> LngLat {
        self.geo_code.into()
    }
}

/// A reverse-geocoded place: the county and state containing a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceName {
    /// County (or county-equivalent district) name.
    pub county: String,
    /// State (region) name.
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_edges_are_inclusive() {
        let bbox = BoundingBox::new(41.0, 42.0, -72.0, -71.0);
        assert!(bbox.contains(LngLat::new(-72.0, 41.0)));
        assert!(bbox.contains(LngLat::new(-71.0, 42.0)));
        assert!(!bbox.contains(LngLat::new(-70.999, 41.5)));
        assert!(!bbox.contains(LngLat::new(-71.5, 40.999)));
    }

    #[test]
    fn position_requires_two_components() {
        assert_eq!(
            LngLat::from_position(&[-71.4, 41.8, 12.0]),
            Some(LngLat::new(-71.4, 41.8))
        );
        assert_eq!(LngLat::from_position(&[-71.4]), None);
    }

    #[test]
    fn safety_record_uses_provider_field_names() {
        let json = serde_json::json!({
            "id": "Q930402719",
            "name": "Fox Point",
            "geoCode": { "latitude": 41.8196, "longitude": -71.3997 },
            "safetyScores": {
                "lgbtq": 39,
                "medical": 0,
                "overall": 45,
                "physicalHarm": 36,
                "politicalFreedom": 50,
                "theft": 44,
                "women": 34
            },
            "subType": "DISTRICT"
        });
        let record: SafetyRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.safety_scores.physical_harm, 36);
        assert_eq!(record.safety_scores.political_freedom, 50);
        assert_eq!(record.location(), LngLat::new(-71.3997, 41.8196));
        assert_eq!(record.sub_type.as_deref(), Some("DISTRICT"));
    }

    #[test]
    fn default_view_is_providence() {
        let view = ViewState::default();
        assert!((view.latitude - 41.8268).abs() < f64::EPSILON);
        assert!((view.zoom - ViewState::INITIAL_ZOOM).abs() < f64::EPSILON);
    }
}
