//! Geocoding providers known to SafeTravels.
//!
//! Providers are described by TOML files in `services/`, embedded at
//! compile time. A provider's `priority` decides the order in which
//! address resolution tries it; search and reverse geocoding always use
//! Mapbox.

use serde::Deserialize;

/// One provider entry from `services/*.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Short identifier used in logs.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Disabled providers are never called.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Address resolution order; lower goes first.
    pub priority: u32,
    /// Endpoint settings, tagged by `type`.
    pub provider: ProviderConfig,
}

/// Endpoint settings for each supported provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Mapbox Geocoding v5. `base_url` ends at `mapbox.places`; the query
    /// is appended as a path segment.
    Mapbox {
        /// Endpoint prefix.
        base_url: String,
    },
    /// Google Geocoding API JSON endpoint.
    Google {
        /// Endpoint URL.
        base_url: String,
    },
}

const fn enabled_by_default() -> bool {
    true
}

impl GeocodingService {
    /// Endpoint URL of whichever provider this is.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Mapbox { base_url } | ProviderConfig::Google { base_url } => base_url,
        }
    }
}

const EMBEDDED: [(&str, &str); 2] = [
    ("mapbox", include_str!("../services/mapbox.toml")),
    ("google", include_str!("../services/google.toml")),
];

/// Every registered provider, enabled or not, in file order.
///
/// # Panics
///
/// Panics if an embedded TOML file does not parse. The files ship inside
/// the binary, so this only fires on a broken build.
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    EMBEDDED
        .iter()
        .map(|(file, text)| {
            toml::de::from_str(text)
                .unwrap_or_else(|e| panic!("services/{file}.toml is not a valid provider: {e}"))
        })
        .collect()
}

/// Enabled providers in resolution order.
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> = all_services()
        .into_iter()
        .filter(|service| service.enabled)
        .collect();
    services.sort_by_key(|service| service.priority);
    services
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_embedded_file_parses_with_https_endpoint() {
        let services = all_services();
        assert_eq!(services.len(), EMBEDDED.len());
        for service in &services {
            assert!(!service.name.is_empty());
            assert!(service.base_url().starts_with("https://"), "{}", service.id);
        }
    }

    #[test]
    fn google_resolves_addresses_before_mapbox() {
        let ids: Vec<String> = enabled_services().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["google", "mapbox"]);
    }

    #[test]
    fn mapbox_base_url_ends_at_places() {
        let mapbox = all_services()
            .into_iter()
            .find(|s| matches!(s.provider, ProviderConfig::Mapbox { .. }))
            .unwrap();
        assert!(mapbox.base_url().ends_with("mapbox.places"));
    }

    #[test]
    fn missing_enabled_defaults_to_true() {
        let service: GeocodingService = toml::de::from_str(
            r#"
            id = "local"
            name = "Local Mapbox mirror"
            priority = 9

            [provider]
            type = "mapbox"
            base_url = "https://mapbox.internal.test/mapbox.places"
            "#,
        )
        .unwrap();
        assert!(service.enabled);
    }
}
