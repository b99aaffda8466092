//! In-memory [`Backend`] for unit tests.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use geojson::FeatureCollection;
use safe_travels_geo::features;
use safe_travels_geo_models::{
    BoundingBox, GeoCode, HazardMarker, LngLat, SafetyRecord, SafetyScores,
};
use safe_travels_server_models::{
    AuthSuccess, HazardReceipt, HistoryResponse, ReverseResult, SafestRoute, SafetyData,
};

use crate::api::{Backend, ClientError};

/// The one safety record every fake route returns.
pub fn brown_pin() -> SafetyRecord {
    SafetyRecord {
        id: "Q1".to_string(),
        name: "College Hill".to_string(),
        geo_code: GeoCode {
            latitude: 41.8262,
            longitude: -71.4032,
        },
        safety_scores: SafetyScores {
            overall: 32,
            women: 41,
            ..SafetyScores::default()
        },
        sub_type: Some("DISTRICT".to_string()),
    }
}

#[derive(Default)]
pub struct FakeBackend {
    /// Every call fails as if the server were down.
    offline: bool,
    registered: Mutex<BTreeSet<String>>,
    last_bbox: Mutex<Option<BoundingBox>>,
    reported: AtomicUsize,
    reverse_calls: AtomicUsize,
}

impl FakeBackend {
    /// A backend whose every call fails with a 503.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn last_bbox(&self) -> Option<BoundingBox> {
        *self.last_bbox.lock().unwrap()
    }

    pub fn reported_hazards(&self) -> usize {
        self.reported.load(Ordering::SeqCst)
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    const fn check_online(&self) -> Result<(), ClientError> {
        if self.offline {
            Err(ClientError::Status { status: 503 })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, username: &str, password: &str) -> Result<AuthSuccess, ClientError> {
        self.check_online()?;
        if username == "test1" && password == "test1" {
            Ok(AuthSuccess {
                message: "Login successful".to_string(),
            })
        } else {
            Err(ClientError::Rejected {
                message: "Invalid username or password".to_string(),
            })
        }
    }

    async fn register(&self, username: &str, _password: &str) -> Result<AuthSuccess, ClientError> {
        self.check_online()?;
        if self.registered.lock().unwrap().insert(username.to_string()) {
            Ok(AuthSuccess {
                message: "User registered".to_string(),
            })
        } else {
            Err(ClientError::Rejected {
                message: "Username already exists".to_string(),
            })
        }
    }

    async fn redlining(&self, bbox: BoundingBox) -> Result<FeatureCollection, ClientError> {
        self.check_online()?;
        *self.last_bbox.lock().unwrap() = Some(bbox);
        Ok(features::collection(Vec::new()))
    }

    async fn search(&self, place: &str) -> Result<serde_json::Value, ClientError> {
        self.check_online()?;
        Ok(serde_json::json!({
            "type": "FeatureCollection",
            "query": [place],
            "features": [{ "center": [-71.4128, 41.824], "place_name": place }]
        }))
    }

    async fn reverse(&self, point: LngLat) -> Result<ReverseResult, ClientError> {
        self.check_online()?;
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ReverseResult {
            latitude: point.latitude,
            longitude: point.longitude,
            county: "Providence County".to_string(),
            state: "Rhode Island".to_string(),
        })
    }

    async fn safest_route(&self, start: &str, end: &str) -> Result<SafestRoute, ClientError> {
        self.check_online()?;
        Ok(SafestRoute {
            date_time: Utc::now(),
            start: start.to_string(),
            end: end.to_string(),
            data: SafetyData {
                data: vec![brown_pin()],
            },
        })
    }

    async fn report_hazard(&self, _hazard: &HazardMarker) -> Result<HazardReceipt, ClientError> {
        self.check_online()?;
        let total = self.reported.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(HazardReceipt { total })
    }

    async fn hazards(&self) -> Result<Vec<HazardMarker>, ClientError> {
        self.check_online()?;
        Ok(Vec::new())
    }

    async fn history(&self) -> Result<HistoryResponse, ClientError> {
        self.check_online()?;
        Ok(HistoryResponse::default())
    }
}
