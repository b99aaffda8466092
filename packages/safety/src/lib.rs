#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood safety scores for SafeTravels.
//!
//! Wraps the Amadeus Safe Place API: an OAuth2 client-credentials token is
//! exchanged for a bearer token (cached until shortly before it expires),
//! which is then used to query safety-rated locations within a radius of a
//! point.
//!
//! See <https://developers.amadeus.com/self-service/category/destination-experiences/api-doc/safe-place>

pub mod amadeus;

use async_trait::async_trait;
use safe_travels_geo::route::RouteArea;
use safe_travels_geo_models::SafetyRecord;
use thiserror::Error;

pub use amadeus::{AmadeusClient, AmadeusCredentials};

/// Errors from safety-score lookups.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint refused the credentials.
    #[error("Failed to obtain token: {message}")]
    Token {
        /// Status or error text from the token endpoint.
        message: String,
    },

    /// The safety endpoint answered with a non-success status.
    #[error("Failed to fetch safety ratings: {message}")]
    Provider {
        /// Status or error text from the provider.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Invalid response from safety provider: {0}")]
    Parse(#[from] serde_json::Error),

    /// No client credentials are configured.
    #[error("Safety provider credentials are not configured")]
    NotConfigured,
}

/// Source of neighborhood safety records.
#[async_trait]
pub trait SafetySource: Send + Sync {
    /// Returns the safety records inside `area`.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError`] if the provider cannot be reached or
    /// answers with an error.
    async fn safety_ratings(&self, area: RouteArea) -> Result<Vec<SafetyRecord>, SafetyError>;
}

/// A [`SafetySource`] used when no credentials are configured. Every
/// lookup fails with [`SafetyError::NotConfigured`].
pub struct UnconfiguredSafetySource;

#[async_trait]
impl SafetySource for UnconfiguredSafetySource {
    async fn safety_ratings(&self, _area: RouteArea) -> Result<Vec<SafetyRecord>, SafetyError> {
        Err(SafetyError::NotConfigured)
    }
}
