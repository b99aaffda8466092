//! Amadeus Safe Place client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use safe_travels_geo::route::RouteArea;
use safe_travels_geo_models::SafetyRecord;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{SafetyError, SafetySource};

/// Default OAuth2 token endpoint (test environment).
pub const DEFAULT_AUTH_URL: &str = "https://test.api.amadeus.com/v1/security/oauth2/token";

/// Default API base URL (test environment).
pub const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com/v1";

/// Tokens are refreshed this long before their advertised expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// OAuth2 client credentials for Amadeus.
#[derive(Debug, Clone)]
pub struct AmadeusCredentials {
    /// API key.
    pub client_id: String,
    /// API secret.
    pub client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct SafetyRatedLocations {
    #[serde(default)]
    data: Vec<SafetyRecord>,
}

struct CachedToken {
    value: String,
    refresh_after: Instant,
}

impl CachedToken {
    /// A token issued at `now` that lives `expires_in` seconds. It is due
    /// for refresh `TOKEN_EXPIRY_MARGIN` early, or immediately when its
    /// lifetime is shorter than the margin.
    fn issued(value: String, expires_in: u64, now: Instant) -> Self {
        let lifetime = Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            value,
            refresh_after: now + lifetime,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_after
    }
}

/// Whether the cached token is still usable after a response with `status`.
fn token_survives(status: reqwest::StatusCode) -> bool {
    status != reqwest::StatusCode::UNAUTHORIZED
}

/// Amadeus Safe Place API client with a cached bearer token.
pub struct AmadeusClient {
    client: reqwest::Client,
    auth_url: String,
    base_url: String,
    credentials: AmadeusCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusClient {
    /// Creates a client against the default Amadeus test environment.
    #[must_use]
    pub fn new(client: reqwest::Client, credentials: AmadeusCredentials) -> Self {
        Self::with_urls(client, credentials, DEFAULT_AUTH_URL, DEFAULT_BASE_URL)
    }

    /// Creates a client against explicit token and API URLs.
    #[must_use]
    pub fn with_urls(
        client: reqwest::Client,
        credentials: AmadeusCredentials,
        auth_url: &str,
        base_url: &str,
    ) -> Self {
        Self {
            client,
            auth_url: auth_url.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, fetching a new one if the cached
    /// token is missing or about to expire.
    async fn bearer_token(&self) -> Result<String, SafetyError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        log::debug!("Requesting new Amadeus access token");
        let resp = self
            .client
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SafetyError::Token {
                message: resp.status().to_string(),
            });
        }

        let body: TokenResponse = serde_json::from_str(&resp.text().await?)?;
        *cached = Some(CachedToken::issued(
            body.access_token.clone(),
            body.expires_in,
            Instant::now(),
        ));

        Ok(body.access_token)
    }
}

#[async_trait]
impl SafetySource for AmadeusClient {
    async fn safety_ratings(&self, area: RouteArea) -> Result<Vec<SafetyRecord>, SafetyError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/safety/safety-rated-locations", self.base_url);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("latitude", area.center.latitude.to_string()),
                ("longitude", area.center.longitude.to_string()),
                ("radius", area.radius_km.to_string()),
                ("page[offset]", "0".to_string()),
            ])
            .send()
            .await?;

        if !token_survives(resp.status()) {
            log::warn!("Amadeus rejected the cached token; dropping it");
            *self.token.lock().await = None;
        }
        if !resp.status().is_success() {
            return Err(SafetyError::Provider {
                message: resp.status().to_string(),
            });
        }

        let records = parse_locations(&resp.text().await?)?;
        log::info!(
            "Fetched {} safety records within {} km of ({}, {})",
            records.len(),
            area.radius_km,
            area.center.latitude,
            area.center.longitude
        );
        Ok(records)
    }
}

fn parse_locations(body: &str) -> Result<Vec<SafetyRecord>, SafetyError> {
    let parsed: SafetyRatedLocations = serde_json::from_str(body)?;
    Ok(parsed.data)
}
