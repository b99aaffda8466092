//! Mapbox Geocoding v5 client.
//!
//! Forward geocoding backs the search bar and passes the provider's JSON
//! through unchanged (the map client reads `features[].center`). Reverse
//! geocoding extracts the county and state containing a point.
//!
//! See <https://docs.mapbox.com/api/search/geocoding-v5/>

use safe_travels_geo_models::{LngLat, PlaceName};

use crate::GeocodeError;

/// Forward-geocodes a free-text place name.
///
/// Returns the raw Mapbox response, a `FeatureCollection` whose features
/// carry a `center` of `[longitude, latitude]`.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the request fails, Mapbox answers with a
/// non-success status, or the body is not JSON.
pub async fn forward(
    client: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    place: &str,
) -> Result<serde_json::Value, GeocodeError> {
    let url = endpoint(base_url, place)?;
    get_json(client, url, access_token).await
}

/// Reverse-geocodes a point into the county and state containing it.
///
/// Returns `Ok(None)` when Mapbox knows no district for the point (e.g.,
/// open water).
///
/// # Errors
///
/// Returns [`GeocodeError`] if the request fails or the response is not
/// JSON.
pub async fn reverse(
    client: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    point: LngLat,
) -> Result<Option<PlaceName>, GeocodeError> {
    let url = endpoint(base_url, &format!("{},{}", point.longitude, point.latitude))?;
    let body = get_json(client, url, access_token).await?;
    parse_reverse(&body)
}

/// Reads the first feature's `center` out of a forward-geocoding response.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] if the body has no `features` array or
/// the first feature's `center` is malformed.
pub fn first_center(body: &serde_json::Value) -> Result<Option<LngLat>, GeocodeError> {
    let features = body["features"]
        .as_array()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Mapbox response has no features array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let center: Vec<f64> =
        serde_json::from_value(first["center"].clone()).map_err(|e| GeocodeError::Parse {
            message: format!("Invalid center in Mapbox feature: {e}"),
        })?;

    LngLat::from_position(&center)
        .map(Some)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Mapbox center has fewer than two coordinates".to_string(),
        })
}

/// Extracts county and state from a reverse-geocoding response.
///
/// The county is the feature whose `place_type` includes `district`; the
/// state is that feature's `region` context entry, falling back to a
/// top-level `region` feature, and is left empty when neither exists.
fn parse_reverse(body: &serde_json::Value) -> Result<Option<PlaceName>, GeocodeError> {
    let features = body["features"]
        .as_array()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Mapbox response has no features array".to_string(),
        })?;

    let Some(district) = features.iter().find(|f| has_place_type(f, "district")) else {
        return Ok(None);
    };

    let Some(county) = district["text"].as_str() else {
        return Err(GeocodeError::Parse {
            message: "Mapbox district has no text".to_string(),
        });
    };

    let from_context = district["context"].as_array().and_then(|context| {
        context
            .iter()
            .find(|c| c["id"].as_str().is_some_and(|id| id.starts_with("region")))
            .and_then(|c| c["text"].as_str())
    });

    let state = from_context.or_else(|| {
        features
            .iter()
            .find(|f| has_place_type(f, "region"))
            .and_then(|f| f["text"].as_str())
    });

    if state.is_none() {
        log::debug!("Mapbox named county '{county}' without a region");
    }

    Ok(Some(PlaceName {
        county: county.to_string(),
        state: state.unwrap_or_default().to_string(),
    }))
}

fn has_place_type(feature: &serde_json::Value, wanted: &str) -> bool {
    feature["place_type"]
        .as_array()
        .is_some_and(|types| types.iter().any(|t| t.as_str() == Some(wanted)))
}

fn endpoint(base_url: &str, query: &str) -> Result<reqwest::Url, GeocodeError> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| GeocodeError::Parse {
        message: format!("Invalid Mapbox base URL {base_url}: {e}"),
    })?;

    url.path_segments_mut()
        .map_err(|()| GeocodeError::Parse {
            message: format!("Mapbox base URL {base_url} cannot have path segments"),
        })?
        .pop_if_empty()
        .push(&format!("{query}.json"));

    Ok(url)
}

async fn get_json(
    client: &reqwest::Client,
    url: reqwest::Url,
    access_token: &str,
) -> Result<serde_json::Value, GeocodeError> {
    let resp = client
        .get(url)
        .query(&[("access_token", access_token)])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }
    if !resp.status().is_success() {
        return Err(GeocodeError::Provider {
            message: format!("Mapbox returned status {}", resp.status()),
        });
    }

    Ok(resp.json().await?)
}
