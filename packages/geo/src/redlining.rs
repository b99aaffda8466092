//! Bounding-box filtering of the historical redlining overlay.
//!
//! A feature is kept only when every position of its geometry lies inside
//! the requested box, so districts straddling the edge of the viewport are
//! dropped rather than clipped. Features without a geometry are skipped.

use geo::BoundingRect;
use geojson::{Feature, FeatureCollection};
use safe_travels_geo_models::{BoundingBox, LngLat};

use crate::GeoError;

/// Parses a `GeoJSON` document that must be a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`GeoError::Parse`] if the text is not valid `GeoJSON`, or
/// [`GeoError::Shape`] if it is a bare geometry or single feature.
pub fn parse_collection(text: &str) -> Result<FeatureCollection, GeoError> {
    match text.parse::<geojson::GeoJson>()? {
        geojson::GeoJson::FeatureCollection(collection) => Ok(collection),
        geojson::GeoJson::Feature(_) => Err(GeoError::Shape {
            message: "expected a FeatureCollection, found a Feature".to_string(),
        }),
        geojson::GeoJson::Geometry(_) => Err(GeoError::Shape {
            message: "expected a FeatureCollection, found a Geometry".to_string(),
        }),
    }
}

/// Returns a new collection holding the features of `collection` that lie
/// entirely inside `bbox`, in their original order.
#[must_use]
pub fn filter_to_bbox(collection: &FeatureCollection, bbox: &BoundingBox) -> FeatureCollection {
    let features: Vec<Feature> = collection
        .features
        .iter()
        .filter(|feature| feature_within(feature, bbox))
        .cloned()
        .collect();

    log::debug!(
        "Redlining filter kept {}/{} features",
        features.len(),
        collection.features.len()
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Whether every position of `feature` lies inside `bbox`.
///
/// Features with no geometry, or whose geometry has no positions, are not
/// considered inside.
#[must_use]
pub fn feature_within(feature: &Feature, bbox: &BoundingBox) -> bool {
    let Some(geometry) = &feature.geometry else {
        return false;
    };
    let Ok(shape) = geo::Geometry::<f64>::try_from(geometry.clone()) else {
        log::debug!("Skipping redlining feature with unconvertible geometry");
        return false;
    };

    shape.bounding_rect().is_some_and(|rect| {
        bbox.contains(LngLat::new(rect.min().x, rect.min().y))
            && bbox.contains(LngLat::new(rect.max().x, rect.max().y))
    })
}

#[cfg(test)]
mod tests {
    use geojson::{Geometry, Value};

    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "holc_grade": "A", "name": "Inside" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-71.41, 41.82], [-71.40, 41.82], [-71.40, 41.83], [-71.41, 41.82]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "holc_grade": "D", "name": "Straddling" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-71.41, 41.82], [-71.30, 41.82], [-71.30, 41.83], [-71.41, 41.82]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "holc_grade": "B", "name": "No geometry" },
                "geometry": null
            }
        ]
    }"#;

    fn providence() -> BoundingBox {
        BoundingBox::new(41.8, 41.9, -71.5, -71.35)
    }

    #[test]
    fn keeps_only_features_fully_inside() {
        let collection = parse_collection(SAMPLE).unwrap();
        let filtered = filter_to_bbox(&collection, &providence());
        assert_eq!(filtered.features.len(), 1);
        assert_eq!(
            filtered.features[0].property("name"),
            Some(&serde_json::json!("Inside"))
        );
    }

    #[test]
    fn world_box_keeps_every_feature_with_geometry() {
        let collection = parse_collection(SAMPLE).unwrap();
        let filtered = filter_to_bbox(&collection, &BoundingBox::WORLD);
        assert_eq!(filtered.features.len(), 2);
    }

    #[test]
    fn inverted_box_keeps_nothing() {
        let collection = parse_collection(SAMPLE).unwrap();
        let inverted = BoundingBox::new(41.9, 41.8, -71.35, -71.5);
        assert!(filter_to_bbox(&collection, &inverted).features.is_empty());
    }

    #[test]
    fn rejects_non_collection_documents() {
        let point = r#"{ "type": "Point", "coordinates": [-71.4, 41.8] }"#;
        assert!(matches!(
            parse_collection(point),
            Err(GeoError::Shape { .. })
        ));
        assert!(matches!(parse_collection("not json"), Err(GeoError::Parse(_))));
    }

    #[test]
    fn point_feature_on_edge_is_inside() {
        let feature = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![-71.5, 41.8]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        assert!(feature_within(&feature, &providence()));
    }
}
