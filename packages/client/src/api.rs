//! HTTP client for the SafeTravels backend.

use async_trait::async_trait;
use geojson::FeatureCollection;
use safe_travels_geo::features;
use safe_travels_geo_models::{BoundingBox, HazardMarker, LngLat};
use safe_travels_server_models::{
    ApiResponse, AuthRequest, AuthSuccess, HazardReceipt, HazardRequest, HistoryResponse,
    RedliningQueryParams, ReverseParams, ReverseResult, SafestRoute, SafestRouteParams,
    SearchParams,
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Backend URL used when `SAFE_TRAVELS_SERVER` is not set.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3232";

/// Errors from backend calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with no recognisable error body.
    #[error("Server returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The server answered with an explicit `fail` or `error` tag.
    #[error("{message}")]
    Rejected {
        /// The server's error text.
        message: String,
    },

    /// The body was not the JSON shape the endpoint promises.
    #[error("Unexpected response shape: {message}")]
    UnexpectedShape {
        /// What was wrong with it.
        message: String,
    },
}

/// Everything the map client asks of the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /login`.
    async fn login(&self, username: &str, password: &str) -> Result<AuthSuccess, ClientError>;

    /// `POST /register`.
    async fn register(&self, username: &str, password: &str)
    -> Result<AuthSuccess, ClientError>;

    /// `GET /redlining` for `bbox`.
    async fn redlining(&self, bbox: BoundingBox) -> Result<FeatureCollection, ClientError>;

    /// `GET /mapbox`: the geocoder's raw response for `place`.
    async fn search(&self, place: &str) -> Result<serde_json::Value, ClientError>;

    /// `GET /reverse` for `point`.
    async fn reverse(&self, point: LngLat) -> Result<ReverseResult, ClientError>;

    /// `GET /safestroute` from `start` to `end`.
    async fn safest_route(&self, start: &str, end: &str) -> Result<SafestRoute, ClientError>;

    /// `POST /hazards`.
    async fn report_hazard(&self, hazard: &HazardMarker) -> Result<HazardReceipt, ClientError>;

    /// `GET /hazards`.
    async fn hazards(&self) -> Result<Vec<HazardMarker>, ClientError>;

    /// `GET /history`.
    async fn history(&self) -> Result<HistoryResponse, ClientError>;
}

/// [`Backend`] over HTTP.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client for the server at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a client for `SAFE_TRAVELS_SERVER`, or
    /// [`DEFAULT_SERVER_URL`] when it is unset.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("SAFE_TRAVELS_SERVER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        log::debug!("Using SafeTravels server at {base_url}");
        Self::new(&base_url)
    }

    /// The server this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &(impl Serialize + Sync),
    ) -> Result<T, ClientError> {
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        read_body(resp.status(), &resp.text().await?)
    }

    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.client.get(self.url(path)).send().await?;
        read_body(resp.status(), &resp.text().await?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, ClientError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        read_body(resp.status(), &resp.text().await?)
    }

    async fn auth(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthSuccess, ClientError> {
        let body = AuthRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        into_success(self.post(path, &body).await?)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn login(&self, username: &str, password: &str) -> Result<AuthSuccess, ClientError> {
        self.auth("/login", username, password).await
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSuccess, ClientError> {
        self.auth("/register", username, password).await
    }

    async fn redlining(&self, bbox: BoundingBox) -> Result<FeatureCollection, ClientError> {
        self.get("/redlining", &RedliningQueryParams::from(bbox)).await
    }

    async fn search(&self, place: &str) -> Result<serde_json::Value, ClientError> {
        let params = SearchParams {
            place: Some(place.to_string()),
            access_token: None,
        };
        self.get("/mapbox", &params).await
    }

    async fn reverse(&self, point: LngLat) -> Result<ReverseResult, ClientError> {
        into_success(self.get("/reverse", &ReverseParams::from(point)).await?)
    }

    async fn safest_route(&self, start: &str, end: &str) -> Result<SafestRoute, ClientError> {
        let params = SafestRouteParams {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        };
        into_success(self.get("/safestroute", &params).await?)
    }

    async fn report_hazard(&self, hazard: &HazardMarker) -> Result<HazardReceipt, ClientError> {
        let body = HazardRequest {
            longitude: hazard.location.longitude,
            latitude: hazard.location.latitude,
            title: hazard.title.clone(),
        };
        into_success(self.post("/hazards", &body).await?)
    }

    async fn hazards(&self) -> Result<Vec<HazardMarker>, ClientError> {
        let collection: FeatureCollection = self.get_all("/hazards").await?;
        collection
            .features
            .iter()
            .map(|f| {
                features::hazard_from_feature(f).map_err(|e| ClientError::UnexpectedShape {
                    message: e.to_string(),
                })
            })
            .collect()
    }

    async fn history(&self) -> Result<HistoryResponse, ClientError> {
        self.get_all("/history").await
    }
}

/// Unwraps a `success` envelope, turning `fail`/`error` into
/// [`ClientError::Rejected`].
fn into_success<T>(response: ApiResponse<T>) -> Result<T, ClientError> {
    match response {
        ApiResponse::Success(value) => Ok(value),
        ApiResponse::Fail { error } => Err(ClientError::Rejected { message: error }),
        ApiResponse::Error {
            error_type,
            details,
        } => Err(ClientError::Rejected {
            message: details.unwrap_or_else(|| format!("{error_type:?}")),
        }),
    }
}

/// Decodes a response body.
///
/// A tagged `fail`/`error` body is a rejection whatever the status; any
/// other non-success status is [`ClientError::Status`].
fn read_body<T: DeserializeOwned>(
    status: reqwest::StatusCode,
    text: &str,
) -> Result<T, ClientError> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        return Err(ClientError::UnexpectedShape {
            message: "body is not JSON".to_string(),
        });
    };

    if !status.is_success() {
        return Err(rejection(&value).unwrap_or(ClientError::Status {
            status: status.as_u16(),
        }));
    }

    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedShape {
        message: e.to_string(),
    })
}

fn rejection(value: &serde_json::Value) -> Option<ClientError> {
    let message = match value["type"].as_str()? {
        "fail" => value["error"].as_str()?.to_string(),
        "error" => value["details"]
            .as_str()
            .or_else(|| value["error_type"].as_str())?
            .to_string(),
        _ => return None,
    };
    Some(ClientError::Rejected { message })
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn fail_envelope_becomes_rejection() {
        let resp: ApiResponse<AuthSuccess> = read_body(
            StatusCode::OK,
            r#"{"type":"fail","error":"User not found"}"#,
        )
        .unwrap();
        let err = into_success(resp).unwrap_err();
        assert!(matches!(err, ClientError::Rejected { message } if message == "User not found"));
    }

    #[test]
    fn error_body_on_bad_status_is_rejection() {
        let err = read_body::<serde_json::Value>(
            StatusCode::BAD_GATEWAY,
            r#"{"type":"error","error_type":"datasource","details":"Rate limit exceeded"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Rejected { message } if message == "Rate limit exceeded"));
    }

    #[test]
    fn plain_text_error_is_status() {
        let err = read_body::<serde_json::Value>(StatusCode::NOT_FOUND, "Not Found").unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404 }));
    }

    #[test]
    fn wrong_shape_is_unexpected() {
        let err = read_body::<FeatureCollection>(StatusCode::OK, &json!({ "foo": 1 }).to_string())
            .unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape { .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(
            BackendClient::new("http://localhost:3232/").url("/health"),
            "http://localhost:3232/health"
        );
    }
}
