#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the SafeTravels server.
//!
//! These types are serialized to JSON for the REST API and shared with the
//! client crate so both sides agree on the wire contract. Responses that
//! carry a status use the `type` tag (`success`, `fail`, `error`) the map
//! client switches on.

use chrono::{DateTime, Utc};
use safe_travels_geo_models::{BoundingBox, LngLat, SafetyRecord};
use serde::{Deserialize, Serialize};

/// Tagged response envelope.
///
/// `Success` flattens its payload next to the tag, so
/// `ApiResponse::Success(AuthSuccess { message })` serializes as
/// `{"type":"success","message":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    /// The request was served.
    Success(T),
    /// The request was understood but refused (e.g. bad credentials).
    Fail {
        /// Human-readable reason.
        error: String,
    },
    /// The request could not be served.
    Error {
        /// Broad error category.
        error_type: ErrorType,
        /// Provider or parser detail, when there is any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl<T> ApiResponse<T> {
    /// Builds a `fail` response.
    pub fn fail(error: impl Into<String>) -> Self {
        Self::Fail {
            error: error.into(),
        }
    }

    /// Builds an `error` response.
    pub const fn error(error_type: ErrorType, details: Option<String>) -> Self {
        Self::Error {
            error_type,
            details,
        }
    }
}

/// Error response for endpoints whose success body is not an envelope.
pub type ErrorResponse = ApiResponse<serde_json::Map<String, serde_json::Value>>;

/// Category of an `error` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Missing or malformed request parameters.
    BadRequest,
    /// An upstream data source failed or is not configured.
    Datasource,
}

/// Body of `POST /login` and `POST /register`.
///
/// Missing fields decode as empty so the credential store answers them
/// with its own "required" failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthRequest {
    /// Account name.
    pub username: String,
    /// Plaintext password (sent over the request body, never the URL).
    pub password: String,
}

/// Success payload of the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccess {
    /// Confirmation text.
    pub message: String,
}

/// Query parameters for `GET /redlining`.
///
/// Kept as strings so a non-numeric bound is answered with a JSON
/// `bad_request` body rather than the extractor's plain-text error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedliningQueryParams {
    /// Southern latitude boundary.
    pub min_lat: Option<String>,
    /// Northern latitude boundary.
    pub max_lat: Option<String>,
    /// Western longitude boundary.
    pub min_lon: Option<String>,
    /// Eastern longitude boundary.
    pub max_lon: Option<String>,
}

impl RedliningQueryParams {
    /// Parses all four bounds. Returns `None` if any is missing or not a
    /// number.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        Some(BoundingBox::new(
            parse(&self.min_lat)?,
            parse(&self.max_lat)?,
            parse(&self.min_lon)?,
            parse(&self.max_lon)?,
        ))
    }
}

impl From<BoundingBox> for RedliningQueryParams {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            min_lat: Some(bbox.min_lat.to_string()),
            max_lat: Some(bbox.max_lat.to_string()),
            min_lon: Some(bbox.min_lon.to_string()),
            max_lon: Some(bbox.max_lon.to_string()),
        }
    }
}

/// Query parameters for `GET /mapbox`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Free-text place name.
    pub place: Option<String>,
    /// Client-supplied token, only honoured when the server has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Query parameters for `GET /reverse`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReverseParams {
    /// Longitude.
    pub lon: Option<String>,
    /// Latitude.
    pub lat: Option<String>,
}

impl ReverseParams {
    /// Parses the point. Returns `None` if either coordinate is missing or
    /// not a number.
    #[must_use]
    pub fn point(&self) -> Option<LngLat> {
        let lon = self.lon.as_deref()?.trim().parse().ok()?;
        let lat = self.lat.as_deref()?.trim().parse().ok()?;
        Some(LngLat::new(lon, lat))
    }
}

impl From<LngLat> for ReverseParams {
    fn from(point: LngLat) -> Self {
        Self {
            lon: Some(point.longitude.to_string()),
            lat: Some(point.latitude.to_string()),
        }
    }
}

/// Success payload of `GET /reverse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseResult {
    /// Latitude that was looked up.
    pub latitude: f64,
    /// Longitude that was looked up.
    pub longitude: f64,
    /// County containing the point.
    pub county: String,
    /// State containing the point.
    pub state: String,
}

/// Query parameters for `GET /safestroute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafestRouteParams {
    /// Free-text start address.
    pub start: Option<String>,
    /// Free-text destination address.
    pub end: Option<String>,
}

/// The provider's `data` wrapper, kept so clients read `data.data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SafetyData {
    /// Safety records near the route.
    pub data: Vec<SafetyRecord>,
}

/// Success payload of `GET /safestroute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafestRoute {
    /// When the route was generated.
    pub date_time: DateTime<Utc>,
    /// Start address as given.
    pub start: String,
    /// Destination address as given.
    pub end: String,
    /// Safety records along the route.
    pub data: SafetyData,
}

/// A previously generated route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHistoryEntry {
    /// Start address.
    pub start: String,
    /// Destination address.
    pub end: String,
    /// When the route was generated.
    pub date_time: DateTime<Utc>,
}

/// Body of `GET /history`. Both lists are most-recent first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Recent search terms.
    pub searches: Vec<String>,
    /// Recent routes.
    pub routes: Vec<RouteHistoryEntry>,
}

/// Body of `POST /hazards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardRequest {
    /// Longitude of the hazard.
    pub longitude: f64,
    /// Latitude of the hazard.
    pub latitude: f64,
    /// Description.
    pub title: String,
}

/// Success payload of `POST /hazards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardReceipt {
    /// Number of hazards stored after this one was added.
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_payload_is_flattened_next_to_tag() {
        let body = serde_json::to_value(ApiResponse::Success(AuthSuccess {
            message: "Logged in".to_string(),
        }))
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "type": "success", "message": "Logged in" })
        );
    }

    #[test]
    fn error_omits_missing_details() {
        let body = serde_json::to_value(ErrorResponse::error(ErrorType::BadRequest, None)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "type": "error", "error_type": "bad_request" })
        );
    }

    #[test]
    fn fail_round_trips_through_client_view() {
        let parsed: ApiResponse<AuthSuccess> =
            serde_json::from_str(r#"{"type":"fail","error":"Username already exists"}"#).unwrap();
        assert_eq!(parsed, ApiResponse::fail("Username already exists"));
    }

    #[test]
    fn redlining_bounds_require_all_four_numbers() {
        let mut params = RedliningQueryParams {
            min_lat: Some("41.7".to_string()),
            max_lat: Some("41.9".to_string()),
            min_lon: Some("-71.5".to_string()),
            max_lon: None,
        };
        assert!(params.bounds().is_none());

        params.max_lon = Some("abc".to_string());
        assert!(params.bounds().is_none());

        params.max_lon = Some("-71.3".to_string());
        assert_eq!(
            params.bounds(),
            Some(BoundingBox::new(41.7, 41.9, -71.5, -71.3))
        );
    }

    #[test]
    fn reverse_params_parse_point() {
        let params = ReverseParams {
            lon: Some("-71.4".to_string()),
            lat: Some("41.8".to_string()),
        };
        assert_eq!(params.point(), Some(LngLat::new(-71.4, 41.8)));
        assert!(ReverseParams::default().point().is_none());
    }
}
