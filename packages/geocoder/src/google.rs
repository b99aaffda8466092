//! Google Geocoding API client.
//!
//! Used to turn the free-text start and end of a route into coordinates.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use safe_travels_geo_models::LngLat;

use crate::GeocodeError;

/// Geocodes a single free-text address.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails or Google answers
/// with an error status.
pub async fn geocode_address(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    address: &str,
) -> Result<Option<LngLat>, GeocodeError> {
    let resp = client
        .get(base_url)
        .query(&[("address", address), ("key", api_key)])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a Google Geocoding JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<LngLat>, GeocodeError> {
    match body["status"].as_str() {
        Some("OK") => {}
        Some("ZERO_RESULTS") => return Ok(None),
        Some("OVER_QUERY_LIMIT") => return Err(GeocodeError::RateLimited),
        Some(status) => {
            let detail = body["error_message"].as_str().unwrap_or("no details");
            return Err(GeocodeError::Provider {
                message: format!("Google geocoder returned {status}: {detail}"),
            });
        }
        None => {
            return Err(GeocodeError::Parse {
                message: "Google response has no status".to_string(),
            });
        }
    }

    let Some(first) = body["results"].as_array().and_then(|r| r.first()) else {
        return Ok(None);
    };

    let location = &first["geometry"]["location"];
    let lat = location["lat"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in Google response".to_string(),
    })?;
    let lng = location["lng"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lng in Google response".to_string(),
    })?;

    Ok(Some(LngLat::new(lng, lat)))
}
