#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for SafeTravels.
//!
//! Serves login and registration against an in-memory credential store,
//! the bounding-box filtered redlining overlay, place search and reverse
//! geocoding (provider keys stay on the server), safest-route safety
//! scores, user hazard reports, and recent search/route history.

pub mod config;
mod handlers;
pub mod interactive;

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use geojson::FeatureCollection;
use safe_travels_auth::UserStore;
use safe_travels_geo_models::HazardMarker;
use safe_travels_geocoder::{Geocoder, ProviderGeocoder};
use safe_travels_safety::{AmadeusClient, SafetySource, UnconfiguredSafetySource};
use safe_travels_server_models::{HistoryResponse, RouteHistoryEntry};

pub use config::{ConfigError, ServerConfig};

/// Maximum number of entries kept per history list.
pub const HISTORY_LIMIT: usize = 20;

/// Maximum number of hazard reports kept; the oldest are dropped first.
pub const HAZARD_LIMIT: usize = 500;

/// Recent searches and routes, most recent first.
#[derive(Debug, Default)]
pub struct History {
    searches: VecDeque<String>,
    routes: VecDeque<RouteHistoryEntry>,
}

impl History {
    /// Records a search term.
    pub fn record_search(&mut self, place: &str) {
        self.searches.push_front(place.to_string());
        self.searches.truncate(HISTORY_LIMIT);
    }

    /// Records a generated route.
    pub fn record_route(&mut self, entry: RouteHistoryEntry) {
        self.routes.push_front(entry);
        self.routes.truncate(HISTORY_LIMIT);
    }

    /// Returns a copy suitable for the `/history` response.
    #[must_use]
    pub fn snapshot(&self) -> HistoryResponse {
        HistoryResponse {
            searches: self.searches.iter().cloned().collect(),
            routes: self.routes.iter().cloned().collect(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Registered accounts.
    pub users: UserStore,
    /// Forward, reverse and address geocoding.
    pub geocoder: Arc<dyn Geocoder>,
    /// Neighborhood safety scores.
    pub safety: Arc<dyn SafetySource>,
    /// Full redlining overlay, filtered per request.
    pub redlining: FeatureCollection,
    /// Recent searches and routes.
    pub history: RwLock<History>,
    /// Reported hazards in insertion order.
    pub hazards: RwLock<Vec<HazardMarker>>,
}

impl AppState {
    /// Creates state with a freshly seeded user store and empty history.
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        safety: Arc<dyn SafetySource>,
        redlining: FeatureCollection,
    ) -> Self {
        Self {
            users: UserStore::new(),
            geocoder,
            safety,
            redlining,
            history: RwLock::new(History::default()),
            hazards: RwLock::new(Vec::new()),
        }
    }

    /// Builds state backed by the real providers described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the redlining file cannot be loaded.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let redlining = config::load_redlining(&config.redlining_path)?;
        let client = reqwest::Client::new();

        let geocoder = Arc::new(ProviderGeocoder::new(
            client.clone(),
            config.geocoder_keys.clone(),
        ));
        let safety: Arc<dyn SafetySource> = match &config.amadeus {
            Some(credentials) => Arc::new(AmadeusClient::new(client, credentials.clone())),
            None => Arc::new(UnconfiguredSafetySource),
        };

        Ok(Self::new(geocoder, safety, redlining))
    }

    fn with_history<R>(&self, f: impl FnOnce(&mut History) -> R) -> R {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut history)
    }
}

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .route("/health", web::get().to(handlers::health))
        .route("/login", web::post().to(handlers::login))
        .route("/register", web::post().to(handlers::register))
        .route("/redlining", web::get().to(handlers::redlining))
        .route("/mapbox", web::get().to(handlers::search))
        .route("/reverse", web::get().to(handlers::reverse))
        .route("/safestroute", web::get().to(handlers::safest_route))
        .route("/history", web::get().to(handlers::history))
        .route("/hazards", web::get().to(handlers::list_hazards))
        .route("/hazards", web::post().to(handlers::report_hazard));
}

/// Starts the SafeTravels API server.
///
/// Loads the redlining overlay, wires up the configured providers, and
/// starts the Actix-Web HTTP server. The caller initialises logging and
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration cannot be
/// loaded, or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_config(&config).map_err(std::io::Error::other)?);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn history_is_most_recent_first_and_capped() {
        let mut history = History::default();
        for i in 0..(HISTORY_LIMIT + 5) {
            history.record_search(&format!("place {i}"));
        }
        history.record_route(RouteHistoryEntry {
            start: "A".to_string(),
            end: "B".to_string(),
            date_time: Utc::now(),
        });

        let snapshot = history.snapshot();
        assert_eq!(snapshot.searches.len(), HISTORY_LIMIT);
        assert_eq!(snapshot.searches[0], format!("place {}", HISTORY_LIMIT + 4));
        assert_eq!(snapshot.routes.len(), 1);
    }
}
