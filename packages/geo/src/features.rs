//! Conversions between map records and `GeoJSON` features.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use safe_travels_geo_models::{HazardMarker, LngLat, SafetyRecord};

use crate::GeoError;

/// Builds a `Point` feature for a hazard, with a single `title` property.
#[must_use]
pub fn hazard_feature(hazard: &HazardMarker) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        "title".to_string(),
        serde_json::Value::String(hazard.title.clone()),
    );

    point_feature(hazard.location, properties)
}

/// Builds a `Point` feature for a safety pin, carrying its name and scores.
#[must_use]
pub fn safety_pin_feature(record: &SafetyRecord) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), serde_json::Value::String(record.id.clone()));
    properties.insert(
        "name".to_string(),
        serde_json::Value::String(record.name.clone()),
    );
    if let Ok(scores) = serde_json::to_value(record.safety_scores) {
        properties.insert("safetyScores".to_string(), scores);
    }

    point_feature(record.location(), properties)
}

/// Wraps a list of features in a `FeatureCollection`.
#[must_use]
pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Builds a `FeatureCollection` of hazard markers, preserving order.
#[must_use]
pub fn hazard_collection(hazards: &[HazardMarker]) -> FeatureCollection {
    collection(hazards.iter().map(hazard_feature).collect())
}

/// Reads a hazard marker back out of a `Point` feature.
///
/// # Errors
///
/// Returns [`GeoError::Shape`] if the feature is not a point or has no
/// string `title` property.
pub fn hazard_from_feature(feature: &Feature) -> Result<HazardMarker, GeoError> {
    let location = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(position)) => {
            LngLat::from_position(position).ok_or_else(|| GeoError::Shape {
                message: "hazard point has fewer than two coordinates".to_string(),
            })?
        }
        _ => {
            return Err(GeoError::Shape {
                message: "hazard feature is not a Point".to_string(),
            });
        }
    };

    let title = feature
        .property("title")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| GeoError::Shape {
            message: "hazard feature has no title".to_string(),
        })?;

    Ok(HazardMarker {
        location,
        title: title.to_string(),
    })
}

fn point_feature(location: LngLat, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(location.to_position()))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use safe_travels_geo_models::{GeoCode, SafetyScores};

    use super::*;

    #[test]
    fn hazard_feature_is_a_titled_point() {
        let hazard = HazardMarker {
            location: LngLat::new(-71.4025, 41.8268),
            title: "Broken glass".to_string(),
        };
        let json = serde_json::to_value(hazard_feature(&hazard)).unwrap();
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["geometry"]["coordinates"][0], -71.4025);
        assert_eq!(json["properties"]["title"], "Broken glass");
    }

    #[test]
    fn hazard_survives_feature_conversion() {
        let hazard = HazardMarker {
            location: LngLat::new(-71.41, 41.83),
            title: "Construction".to_string(),
        };
        let back = hazard_from_feature(&hazard_feature(&hazard)).unwrap();
        assert_eq!(back, hazard);
    }

    #[test]
    fn untitled_point_is_rejected() {
        let feature = point_feature(LngLat::new(0.0, 0.0), JsonObject::new());
        assert!(hazard_from_feature(&feature).is_err());
    }

    #[test]
    fn safety_pin_feature_carries_scores() {
        let record = SafetyRecord {
            id: "Q1".to_string(),
            name: "College Hill".to_string(),
            geo_code: GeoCode {
                latitude: 41.8268,
                longitude: -71.4003,
            },
            safety_scores: SafetyScores {
                overall: 30,
                ..SafetyScores::default()
            },
            sub_type: None,
        };
        let json = serde_json::to_value(safety_pin_feature(&record)).unwrap();
        assert_eq!(json["properties"]["name"], "College Hill");
        assert_eq!(json["properties"]["safetyScores"]["overall"], 30);
    }
}
