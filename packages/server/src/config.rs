//! Start-up configuration read from the environment.

use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use safe_travels_geo::{GeoError, features, redlining};
use safe_travels_geocoder::GeocoderKeys;
use safe_travels_safety::AmadeusCredentials;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default port.
pub const DEFAULT_PORT: u16 = 3232;

/// Default location of the redlining `GeoJSON` file.
pub const DEFAULT_REDLINING_PATH: &str = "data/redlining/data.json";

/// Errors raised while assembling the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("Invalid PORT value '{value}'")]
    InvalidPort {
        /// The rejected value.
        value: String,
    },

    /// The redlining file exists but could not be read.
    #[error("Failed to read redlining data at {}: {source}", path.display())]
    RedliningIo {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The redlining file is not a `GeoJSON` `FeatureCollection`.
    #[error("Invalid redlining data at {}: {source}", path.display())]
    RedliningParse {
        /// Path that was read.
        path: PathBuf,
        /// Underlying parse error.
        source: GeoError,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Path of the redlining `GeoJSON` file.
    pub redlining_path: PathBuf,
    /// Geocoding provider keys.
    pub geocoder_keys: GeocoderKeys,
    /// Amadeus credentials, if both halves are set.
    pub amadeus: Option<AmadeusCredentials>,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `PORT` is set but is not a
    /// valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `PORT` is set but is not a
    /// valid port number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value })?,
            None => DEFAULT_PORT,
        };
        let redlining_path = var("REDLINING_DATA_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_REDLINING_PATH), PathBuf::from);

        let geocoder_keys = GeocoderKeys {
            mapbox_token: var("MAPBOX_ACCESS_TOKEN"),
            google_key: var("GOOGLE_GEOCODING_KEY"),
        };
        if geocoder_keys.mapbox_token.is_none() {
            log::warn!("MAPBOX_ACCESS_TOKEN not set; search and reverse geocoding are disabled");
        }

        let amadeus = match (var("AMADEUS_CLIENT_ID"), var("AMADEUS_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(AmadeusCredentials {
                client_id,
                client_secret,
            }),
            _ => {
                log::warn!("Amadeus credentials not set; safest route lookups are disabled");
                None
            }
        };

        Ok(Self {
            bind_addr,
            port,
            redlining_path,
            geocoder_keys,
            amadeus,
        })
    }
}

/// Loads the redlining overlay from `path`.
///
/// A missing file is logged and served as an empty collection.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or is not
/// a `FeatureCollection`.
pub fn load_redlining(path: &Path) -> Result<FeatureCollection, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "Redlining data not found at {}; serving an empty overlay",
                path.display()
            );
            return Ok(features::collection(Vec::new()));
        }
        Err(source) => {
            return Err(ConfigError::RedliningIo {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let collection =
        redlining::parse_collection(&text).map_err(|source| ConfigError::RedliningParse {
            path: path.to_path_buf(),
            source,
        })?;

    log::info!(
        "Loaded {} redlining features from {}",
        collection.features.len(),
        path.display()
    );
    Ok(collection)
}
