#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for SafeTravels.
//!
//! Three operations, all routed through the backend so that provider keys
//! never leave the server:
//!
//! 1. **Search**: forward-geocode a place name with Mapbox and hand the
//!    raw response to the map client.
//! 2. **Reverse**: turn a clicked point into a county and state with
//!    Mapbox.
//! 3. **Resolve**: turn a route endpoint address into coordinates, trying
//!    the providers from the [`service_registry`] in priority order and
//!    skipping any whose API key is not configured.

pub mod google;
pub mod mapbox;
pub mod service_registry;

use async_trait::async_trait;
use safe_travels_geo_models::{LngLat, PlaceName};
use service_registry::{GeocodingService, ProviderConfig};
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider answered with an error status.
    #[error("Provider error: {message}")]
    Provider {
        /// Description returned by the provider.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No provider able to serve the request has credentials configured.
    #[error("No geocoding provider configured for {operation}")]
    NotConfigured {
        /// The operation that could not be served.
        operation: &'static str,
    },
}

/// API credentials for the geocoding providers. Either may be absent.
#[derive(Debug, Clone, Default)]
pub struct GeocoderKeys {
    /// Mapbox access token.
    pub mapbox_token: Option<String>,
    /// Google Geocoding API key.
    pub google_key: Option<String>,
}

/// The geocoding operations the backend needs.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward-geocodes `place`, returning the provider's raw JSON.
    ///
    /// `token_override` is used only when no server-side token is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or no token is
    /// available.
    async fn search(
        &self,
        place: &str,
        token_override: Option<&str>,
    ) -> Result<serde_json::Value, GeocodeError>;

    /// Reverse-geocodes `point` into a county and state.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or no token is
    /// configured.
    async fn reverse(&self, point: LngLat) -> Result<Option<PlaceName>, GeocodeError>;

    /// Resolves a free-text address to coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if every configured provider fails, or
    /// none is configured.
    async fn resolve(&self, address: &str) -> Result<Option<LngLat>, GeocodeError>;
}

/// [`Geocoder`] backed by the registered HTTP providers.
pub struct ProviderGeocoder {
    client: reqwest::Client,
    services: Vec<GeocodingService>,
    keys: GeocoderKeys,
}

impl ProviderGeocoder {
    /// Creates a geocoder over the enabled registry services.
    #[must_use]
    pub fn new(client: reqwest::Client, keys: GeocoderKeys) -> Self {
        Self::with_services(client, service_registry::enabled_services(), keys)
    }

    /// Creates a geocoder over an explicit, already-ordered service list.
    #[must_use]
    pub const fn with_services(
        client: reqwest::Client,
        services: Vec<GeocodingService>,
        keys: GeocoderKeys,
    ) -> Self {
        Self {
            client,
            services,
            keys,
        }
    }

    fn mapbox_base_url(&self) -> Option<&str> {
        self.services
            .iter()
            .find(|s| matches!(s.provider, ProviderConfig::Mapbox { .. }))
            .map(GeocodingService::base_url)
    }

    fn key_for(&self, provider: &ProviderConfig) -> Option<&str> {
        match provider {
            ProviderConfig::Mapbox { .. } => self.keys.mapbox_token.as_deref(),
            ProviderConfig::Google { .. } => self.keys.google_key.as_deref(),
        }
    }
}

#[async_trait]
impl Geocoder for ProviderGeocoder {
    async fn search(
        &self,
        place: &str,
        token_override: Option<&str>,
    ) -> Result<serde_json::Value, GeocodeError> {
        let base_url = self
            .mapbox_base_url()
            .ok_or(GeocodeError::NotConfigured { operation: "search" })?;
        let token = self
            .keys
            .mapbox_token
            .as_deref()
            .or(token_override)
            .ok_or(GeocodeError::NotConfigured { operation: "search" })?;

        mapbox::forward(&self.client, base_url, token, place).await
    }

    async fn reverse(&self, point: LngLat) -> Result<Option<PlaceName>, GeocodeError> {
        let base_url = self
            .mapbox_base_url()
            .ok_or(GeocodeError::NotConfigured { operation: "reverse" })?;
        let token = self
            .keys
            .mapbox_token
            .as_deref()
            .ok_or(GeocodeError::NotConfigured { operation: "reverse" })?;

        mapbox::reverse(&self.client, base_url, token, point).await
    }

    async fn resolve(&self, address: &str) -> Result<Option<LngLat>, GeocodeError> {
        let mut last_error = None;
        let mut answered = false;

        for service in &self.services {
            let Some(key) = self.key_for(&service.provider) else {
                log::debug!("Skipping {} for address resolution: no key", service.id);
                continue;
            };

            let result = match &service.provider {
                ProviderConfig::Google { base_url } => {
                    google::geocode_address(&self.client, base_url, key, address).await
                }
                ProviderConfig::Mapbox { base_url } => {
                    match mapbox::forward(&self.client, base_url, key, address).await {
                        Ok(body) => mapbox::first_center(&body),
                        Err(e) => Err(e),
                    }
                }
            };

            match result {
                Ok(Some(point)) => {
                    log::debug!("Resolved '{address}' with {}", service.id);
                    return Ok(Some(point));
                }
                Ok(None) => {
                    log::debug!("{} found no match for '{address}'", service.id);
                    answered = true;
                }
                Err(e) => {
                    log::warn!("{} failed to resolve '{address}': {e}", service.id);
                    last_error = Some(e);
                }
            }
        }

        settle_resolution(answered, last_error)
    }
}

/// Outcome of an address resolution in which no provider found the
/// address. A provider that answered cleanly makes it "no match" even if
/// another one failed; with no answers at all, the last failure is
/// reported.
fn settle_resolution(
    answered: bool,
    last_error: Option<GeocodeError>,
) -> Result<Option<LngLat>, GeocodeError> {
    if answered {
        return Ok(None);
    }
    Err(last_error.unwrap_or(GeocodeError::NotConfigured {
        operation: "resolve",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_without_keys_is_not_configured() {
        let geocoder = ProviderGeocoder::new(reqwest::Client::new(), GeocoderKeys::default());
        assert!(matches!(
            geocoder.resolve("Providence, RI").await,
            Err(GeocodeError::NotConfigured { operation: "resolve" })
        ));
    }

    #[test]
    fn clean_miss_outranks_an_earlier_provider_failure() {
        let denied = GeocodeError::Provider {
            message: "REQUEST_DENIED".to_string(),
        };
        assert!(matches!(settle_resolution(true, Some(denied)), Ok(None)));
    }

    #[test]
    fn failure_is_reported_when_no_provider_answered() {
        let denied = GeocodeError::Provider {
            message: "REQUEST_DENIED".to_string(),
        };
        assert!(matches!(
            settle_resolution(false, Some(denied)),
            Err(GeocodeError::Provider { .. })
        ));
        assert!(matches!(
            settle_resolution(false, None),
            Err(GeocodeError::NotConfigured { operation: "resolve" })
        ));
    }

    #[tokio::test]
    async fn search_without_any_token_is_not_configured() {
        let geocoder = ProviderGeocoder::new(reqwest::Client::new(), GeocoderKeys::default());
        assert!(matches!(
            geocoder.search("Providence", None).await,
            Err(GeocodeError::NotConfigured { operation: "search" })
        ));
    }
}
