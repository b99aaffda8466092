//! HTTP handler functions for the SafeTravels API.

use std::sync::PoisonError;

use actix_web::{
    HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError},
    web,
};
use chrono::Utc;
use safe_travels_geo::{features, redlining, route};
use safe_travels_geo_models::{BoundingBox, HazardMarker, LngLat};
use safe_travels_geocoder::GeocodeError;
use safe_travels_server_models::{
    ApiHealth, ApiResponse, AuthRequest, AuthSuccess, ErrorResponse, ErrorType, HazardReceipt,
    HazardRequest, RedliningQueryParams, ReverseParams, ReverseResult, RouteHistoryEntry,
    SafestRoute, SafestRouteParams, SafetyData, SearchParams,
};

use crate::{AppState, HAZARD_LIMIT};

fn bad_request(details: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::error(
        ErrorType::BadRequest,
        Some(details.to_string()),
    ))
}

fn datasource_error(details: String) -> HttpResponse {
    HttpResponse::BadGateway().json(ErrorResponse::error(ErrorType::Datasource, Some(details)))
}

/// Answers an undecodable JSON body with a `bad_request` envelope instead
/// of actix's plain-text error.
pub fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected JSON body for {}: {err}", req.path());
    let response = bad_request(&err.to_string());
    InternalError::from_response(err, response).into()
}

/// Returns the trimmed value if present and non-blank.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /login`
pub async fn login(state: web::Data<AppState>, body: web::Json<AuthRequest>) -> HttpResponse {
    match state.users.authenticate(&body.username, &body.password) {
        Ok(()) => {
            log::info!("User '{}' logged in", body.username);
            HttpResponse::Ok().json(ApiResponse::Success(AuthSuccess {
                message: "Login successful".to_string(),
            }))
        }
        Err(e) => {
            log::warn!("Login refused for '{}': {e}", body.username);
            HttpResponse::Ok().json(ApiResponse::<AuthSuccess>::fail(e.to_string()))
        }
    }
}

/// `POST /register`
pub async fn register(state: web::Data<AppState>, body: web::Json<AuthRequest>) -> HttpResponse {
    match state.users.register(&body.username, &body.password) {
        Ok(()) => {
            log::info!("Registered user '{}'", body.username);
            HttpResponse::Ok().json(ApiResponse::Success(AuthSuccess {
                message: "User registered".to_string(),
            }))
        }
        Err(e) => {
            log::warn!("Registration refused for '{}': {e}", body.username);
            HttpResponse::Ok().json(ApiResponse::<AuthSuccess>::fail(e.to_string()))
        }
    }
}

/// `GET /redlining`
///
/// Returns the redlining features lying entirely inside the requested box.
pub async fn redlining(
    state: web::Data<AppState>,
    params: web::Query<RedliningQueryParams>,
) -> HttpResponse {
    let Some(bbox) = params.bounds() else {
        return bad_request("minLat, maxLat, minLon and maxLon must all be numbers");
    };

    let filtered = redlining::filter_to_bbox(&state.redlining, &bbox);
    log::debug!(
        "Redlining request {bbox:?} matched {} features",
        filtered.features.len()
    );
    HttpResponse::Ok().json(filtered)
}

/// `GET /mapbox`
///
/// Forward-geocodes a place name and passes the provider's JSON through.
pub async fn search(state: web::Data<AppState>, params: web::Query<SearchParams>) -> HttpResponse {
    let Some(place) = non_blank(params.place.as_deref()) else {
        return bad_request("place is required");
    };

    match state
        .geocoder
        .search(place, params.access_token.as_deref())
        .await
    {
        Ok(body) => {
            state.with_history(|h| h.record_search(place));
            HttpResponse::Ok().json(body)
        }
        Err(e) => {
            log::error!("Search for '{place}' failed: {e}");
            datasource_error(e.to_string())
        }
    }
}

/// `GET /reverse`
///
/// Reverse-geocodes a point into its county and state.
pub async fn reverse(state: web::Data<AppState>, params: web::Query<ReverseParams>) -> HttpResponse {
    let Some(point) = params.point() else {
        return bad_request("lon and lat must both be numbers");
    };

    match state.geocoder.reverse(point).await {
        Ok(Some(place)) => HttpResponse::Ok().json(ApiResponse::Success(ReverseResult {
            latitude: point.latitude,
            longitude: point.longitude,
            county: place.county,
            state: place.state,
        })),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::error(
            ErrorType::Datasource,
            Some(format!(
                "No county found at ({}, {})",
                point.latitude, point.longitude
            )),
        )),
        Err(e) => {
            log::error!("Reverse geocoding {point:?} failed: {e}");
            datasource_error(e.to_string())
        }
    }
}

async fn resolve_endpoint(state: &AppState, address: &str) -> Result<LngLat, String> {
    match state.geocoder.resolve(address).await {
        Ok(Some(point)) => Ok(point),
        Ok(None) => Err(format!("No location found for '{address}'")),
        Err(GeocodeError::NotConfigured { operation }) => {
            Err(format!("No geocoding provider configured for {operation}"))
        }
        Err(e) => Err(format!("Failed to geocode '{address}': {e}")),
    }
}

/// `GET /safestroute`
///
/// Geocodes both ends of a route and returns the safety records around it.
pub async fn safest_route(
    state: web::Data<AppState>,
    params: web::Query<SafestRouteParams>,
) -> HttpResponse {
    let (Some(start), Some(end)) = (
        non_blank(params.start.as_deref()),
        non_blank(params.end.as_deref()),
    ) else {
        return bad_request("start and end are required");
    };

    let (start_point, end_point) = tokio::join!(
        resolve_endpoint(&state, start),
        resolve_endpoint(&state, end)
    );
    let (start_point, end_point) = match (start_point, end_point) {
        (Ok(s), Ok(e)) => (s, e),
        (Err(details), _) | (_, Err(details)) => {
            log::warn!("Safest route {start} -> {end}: {details}");
            return datasource_error(details);
        }
    };

    let area = route::route_area(start_point, end_point);
    log::debug!(
        "Safest route {start} -> {end}: {} km around {:?}",
        area.radius_km,
        area.center
    );

    match state.safety.safety_ratings(area).await {
        Ok(records) => {
            let date_time = Utc::now();
            state.with_history(|h| {
                h.record_route(RouteHistoryEntry {
                    start: start.to_string(),
                    end: end.to_string(),
                    date_time,
                });
            });
            HttpResponse::Ok().json(ApiResponse::Success(SafestRoute {
                date_time,
                start: start.to_string(),
                end: end.to_string(),
                data: SafetyData { data: records },
            }))
        }
        Err(e) => {
            log::error!("Safety lookup for {start} -> {end} failed: {e}");
            datasource_error(e.to_string())
        }
    }
}

/// `GET /history`
pub async fn history(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state
        .history
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .snapshot();
    HttpResponse::Ok().json(snapshot)
}

/// `POST /hazards`
pub async fn report_hazard(
    state: web::Data<AppState>,
    body: web::Json<HazardRequest>,
) -> HttpResponse {
    let title = body.title.trim();
    if title.is_empty() {
        return bad_request("title is required");
    }

    let location = LngLat::new(body.longitude, body.latitude);
    if !BoundingBox::WORLD.contains(location) {
        return bad_request("longitude must be within ±180 and latitude within ±90");
    }

    let marker = HazardMarker {
        location,
        title: title.to_string(),
    };
    log::info!("Hazard reported at {:?}: {}", marker.location, marker.title);

    let total = {
        let mut hazards = state.hazards.write().unwrap_or_else(PoisonError::into_inner);
        hazards.push(marker);
        if hazards.len() > HAZARD_LIMIT {
            let excess = hazards.len() - HAZARD_LIMIT;
            hazards.drain(..excess);
        }
        hazards.len()
    };
    HttpResponse::Ok().json(ApiResponse::Success(HazardReceipt { total }))
}

/// `GET /hazards`
pub async fn list_hazards(state: web::Data<AppState>) -> HttpResponse {
    let hazards = state.hazards.read().unwrap_or_else(PoisonError::into_inner);
    HttpResponse::Ok().json(features::hazard_collection(&hazards))
}
