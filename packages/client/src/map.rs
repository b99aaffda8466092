//! The logged-in map view: camera, overlays, markers, panels and popup.
//!
//! Each fetch is split into a `begin_*` step that takes a request token and
//! a `finish_*` step that applies the response only if the token is still
//! current. The `refresh_*`/`search`/`click`/`generate_safest_route`
//! helpers run both steps back to back for callers that do not interleave
//! requests.

use geojson::FeatureCollection;
use safe_travels_geo::matcher;
use safe_travels_geo_models::{BoundingBox, HazardMarker, LngLat, PlaceName, SafetyRecord, ViewState};
use safe_travels_server_models::{ReverseResult, RouteHistoryEntry, SafestRoute};

use crate::api::{Backend, ClientError};
use crate::panel::{ActivePanel, PanelKind, Popup};
use crate::request_token::{Channel, RequestToken, RequestTracker};

/// Whether a finished request changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The response was applied.
    Yes,
    /// A newer request on the same channel had been started; the response
    /// was dropped.
    Stale,
}

/// State of the map once the user is logged in.
#[derive(Debug, Default)]
pub struct MapSession {
    view: ViewState,
    bbox: BoundingBox,
    redlining: Option<FeatureCollection>,
    search_results: Option<serde_json::Value>,
    hazards: Vec<HazardMarker>,
    safety_pins: Vec<SafetyRecord>,
    popup: Popup,
    panel: ActivePanel,
    /// Route start input.
    pub start: String,
    /// Route destination input.
    pub destination: String,
    previous_routes: Vec<RouteHistoryEntry>,
    tracker: RequestTracker,
}

impl MapSession {
    /// A fresh map over Providence with the world-wide redlining filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current camera.
    #[must_use]
    pub const fn view(&self) -> ViewState {
        self.view
    }

    /// Follows a pan or zoom made on the map.
    pub const fn set_view(&mut self, view: ViewState) {
        self.view = view;
    }

    /// Current redlining filter.
    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Changes the redlining filter. Call [`Self::refresh_redlining`] (or
    /// the begin/finish pair) to fetch the matching overlay.
    pub const fn set_bbox(&mut self, bbox: BoundingBox) {
        self.bbox = bbox;
    }

    /// The last redlining overlay received.
    #[must_use]
    pub const fn redlining(&self) -> Option<&FeatureCollection> {
        self.redlining.as_ref()
    }

    /// The last raw search response received.
    #[must_use]
    pub const fn search_results(&self) -> Option<&serde_json::Value> {
        self.search_results.as_ref()
    }

    /// Hazards shown on the map, in report order.
    #[must_use]
    pub fn hazards(&self) -> &[HazardMarker] {
        &self.hazards
    }

    /// Safety pins from the last route.
    #[must_use]
    pub fn safety_pins(&self) -> &[SafetyRecord] {
        &self.safety_pins
    }

    /// Current popup.
    #[must_use]
    pub const fn popup(&self) -> &Popup {
        &self.popup
    }

    /// Closes the popup.
    pub fn close_popup(&mut self) {
        self.popup = Popup::Hidden;
    }

    /// Current side panel.
    #[must_use]
    pub const fn panel(&self) -> &ActivePanel {
        &self.panel
    }

    /// Mutable side panel, for typing into the hazard draft.
    pub const fn panel_mut(&mut self) -> &mut ActivePanel {
        &mut self.panel
    }

    /// Opens or closes a side panel.
    pub fn toggle_panel(&mut self, kind: PanelKind) {
        self.panel.toggle(kind);
    }

    /// Routes listed in the previous-routes panel, most recent first.
    #[must_use]
    pub fn previous_routes(&self) -> &[RouteHistoryEntry] {
        &self.previous_routes
    }

    // Redlining

    /// Starts a redlining fetch for the current filter.
    pub fn begin_redlining(&mut self) -> (RequestToken, BoundingBox) {
        (self.tracker.issue(Channel::Redlining), self.bbox)
    }

    /// Applies a redlining response.
    ///
    /// # Errors
    ///
    /// Returns the request's error if it is still current. The previous
    /// overlay is kept.
    pub fn finish_redlining(
        &mut self,
        token: RequestToken,
        result: Result<FeatureCollection, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.tracker.accept(token) {
            return Ok(Applied::Stale);
        }
        let collection = result?;
        log::debug!("Showing {} redlining features", collection.features.len());
        self.redlining = Some(collection);
        Ok(Applied::Yes)
    }

    /// Fetches the redlining overlay for the current filter.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the fetch fails.
    pub async fn refresh_redlining(&mut self, backend: &dyn Backend) -> Result<Applied, ClientError> {
        let (token, bbox) = self.begin_redlining();
        let result = backend.redlining(bbox).await;
        self.finish_redlining(token, result)
    }

    // Search

    /// Starts a place search.
    pub fn begin_search(&mut self) -> RequestToken {
        self.tracker.issue(Channel::Search)
    }

    /// Applies a search response: keeps the raw results and flies to the
    /// first result's centre.
    ///
    /// # Errors
    ///
    /// Returns the request's error, or [`ClientError::UnexpectedShape`] if
    /// the body has no usable `features[0].center`.
    pub fn finish_search(
        &mut self,
        token: RequestToken,
        result: Result<serde_json::Value, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.tracker.accept(token) {
            return Ok(Applied::Stale);
        }
        let body = result?;
        let Some(center) = first_center(&body) else {
            return Err(ClientError::UnexpectedShape {
                message: "search response has no feature center".to_string(),
            });
        };

        self.view = ViewState::fly_to(center, ViewState::SEARCH_ZOOM);
        self.search_results = Some(body);
        Ok(Applied::Yes)
    }

    /// Searches for `place`, flies to it and shows its county and state.
    ///
    /// A failed reverse geocode after a successful search is logged and
    /// leaves the place popup unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the search fails or finds nothing.
    pub async fn search(&mut self, backend: &dyn Backend, place: &str) -> Result<Applied, ClientError> {
        let token = self.begin_search();
        let result = backend.search(place).await;
        if self.finish_search(token, result)? == Applied::Stale {
            return Ok(Applied::Stale);
        }

        let center = self.view.center();
        let token = self.begin_place_lookup(center);
        let found = backend.reverse(center).await;
        if let Err(e) = self.finish_reverse(token, found) {
            log::warn!("Could not name the search result at {center:?}: {e}");
        }
        Ok(Applied::Yes)
    }

    // Clicks

    /// Handles a click on the map.
    ///
    /// A click on a hazard or safety pin shows it. Anything else shows an
    /// unresolved place popup and returns the token for the reverse
    /// geocode that should follow.
    pub fn begin_click(&mut self, click: LngLat) -> Option<RequestToken> {
        let hit = matcher::match_click(click, &self.hazards, &self.safety_pins);
        let needs_reverse = !hit.is_hit();
        self.popup = Popup::for_click(click, hit);

        needs_reverse.then(|| self.tracker.issue(Channel::Reverse))
    }

    /// Shows an unresolved place popup at `at` and starts the reverse
    /// geocode that names it.
    pub fn begin_place_lookup(&mut self, at: LngLat) -> RequestToken {
        self.popup = Popup::Place {
            location: at,
            place: None,
        };
        self.tracker.issue(Channel::Reverse)
    }

    /// Fills in the place popup from a reverse geocode.
    ///
    /// # Errors
    ///
    /// Returns the request's error if it is still current. The popup stays
    /// unresolved.
    pub fn finish_reverse(
        &mut self,
        token: RequestToken,
        result: Result<ReverseResult, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.tracker.accept(token) {
            return Ok(Applied::Stale);
        }
        let found = result?;
        if let Popup::Place { place, .. } = &mut self.popup {
            *place = Some(PlaceName {
                county: found.county,
                state: found.state,
            });
            Ok(Applied::Yes)
        } else {
            // The popup was closed or replaced by a marker click meanwhile.
            Ok(Applied::Stale)
        }
    }

    /// Handles a click, reverse geocoding it if it hit no marker.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if reverse geocoding fails.
    pub async fn click(&mut self, backend: &dyn Backend, click: LngLat) -> Result<Applied, ClientError> {
        let Some(token) = self.begin_click(click) else {
            return Ok(Applied::Yes);
        };
        let result = backend.reverse(click).await;
        self.finish_reverse(token, result)
    }

    // Safest route

    /// Starts a safety lookup for the route inputs.
    ///
    /// Returns `None` if either input is blank.
    pub fn begin_safest_route(&mut self) -> Option<(RequestToken, String, String)> {
        let start = self.start.trim();
        let destination = self.destination.trim();
        if start.is_empty() || destination.is_empty() {
            return None;
        }
        let (start, destination) = (start.to_string(), destination.to_string());
        Some((self.tracker.issue(Channel::Safety), start, destination))
    }

    /// Replaces the safety pins with a route's records and adds the route
    /// to the previous-routes list.
    ///
    /// # Errors
    ///
    /// Returns the request's error if it is still current. The previous
    /// pins are kept.
    pub fn finish_safest_route(
        &mut self,
        token: RequestToken,
        result: Result<SafestRoute, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.tracker.accept(token) {
            return Ok(Applied::Stale);
        }
        let route = result?;
        log::info!(
            "Route {} -> {}: {} safety records",
            route.start,
            route.end,
            route.data.data.len()
        );

        self.previous_routes.insert(
            0,
            RouteHistoryEntry {
                start: route.start,
                end: route.end,
                date_time: route.date_time,
            },
        );
        self.safety_pins = route.data.data;
        Ok(Applied::Yes)
    }

    /// "Generate Safest Route": fetches safety records for the route inputs.
    ///
    /// Returns `Ok(None)` without a request if either input is blank.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the lookup fails.
    pub async fn generate_safest_route(
        &mut self,
        backend: &dyn Backend,
    ) -> Result<Option<Applied>, ClientError> {
        let Some((token, start, destination)) = self.begin_safest_route() else {
            log::debug!("Route inputs are blank; not fetching");
            return Ok(None);
        };
        let result = backend.safest_route(&start, &destination).await;
        self.finish_safest_route(token, result).map(Some)
    }

    // Hazards

    /// Submits the hazard draft at the centre of the view.
    ///
    /// A blank draft (or a closed panel) does nothing. Otherwise the
    /// marker is shown immediately, the panel closes, and the report is
    /// posted; a failed post is logged and the marker kept.
    pub async fn submit_hazard(&mut self, backend: &dyn Backend) -> Option<HazardMarker> {
        let title = self.panel.hazard_draft_mut()?.trim().to_string();
        if title.is_empty() {
            return None;
        }

        let marker = HazardMarker {
            location: self.view.center(),
            title,
        };
        self.hazards.push(marker.clone());
        self.panel = ActivePanel::Closed;

        match backend.report_hazard(&marker).await {
            Ok(receipt) => log::debug!("Hazard stored; server holds {}", receipt.total),
            Err(e) => log::warn!("Failed to send hazard '{}': {e}", marker.title),
        }
        Some(marker)
    }

    /// Replaces the local hazards with the server's.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the fetch fails; local hazards are kept.
    pub async fn sync_hazards(&mut self, backend: &dyn Backend) -> Result<usize, ClientError> {
        self.hazards = backend.hazards().await?;
        Ok(self.hazards.len())
    }

    /// Replaces the previous-routes list with the server's history.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the fetch fails.
    pub async fn load_previous_routes(&mut self, backend: &dyn Backend) -> Result<(), ClientError> {
        self.previous_routes = backend.history().await?.routes;
        Ok(())
    }
}

/// Reads `features[0].center` from a geocoder response.
fn first_center(body: &serde_json::Value) -> Option<LngLat> {
    let center = body["features"].as_array()?.first()?["center"].as_array()?;
    let position: Vec<f64> = center.iter().filter_map(serde_json::Value::as_f64).collect();
    LngLat::from_position(&position)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeBackend, brown_pin};

    #[tokio::test]
    async fn search_flies_to_first_result() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();

        assert_eq!(map.search(&backend, "Providence").await.unwrap(), Applied::Yes);
        assert_eq!(map.view().zoom, ViewState::SEARCH_ZOOM);
        assert_eq!(map.view().center(), LngLat::new(-71.4128, 41.824));
        assert!(map.search_results().is_some());
    }

    #[tokio::test]
    async fn search_names_the_result_in_a_popup() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();

        map.search(&backend, "Providence").await.unwrap();
        assert_eq!(backend.reverse_calls(), 1);
        assert_eq!(
            map.popup(),
            &Popup::Place {
                location: LngLat::new(-71.4128, 41.824),
                place: Some(PlaceName {
                    county: "Providence County".to_string(),
                    state: "Rhode Island".to_string(),
                }),
            }
        );
    }

    #[test]
    fn click_after_search_supersedes_its_place_lookup() {
        let mut map = MapSession::new();
        let from_search = map.begin_place_lookup(LngLat::new(-71.4128, 41.824));
        let from_click = map.begin_click(LngLat::new(-71.40, 41.83)).unwrap();

        let named = |county: &str| {
            Ok(ReverseResult {
                latitude: 41.83,
                longitude: -71.40,
                county: county.to_string(),
                state: "Rhode Island".to_string(),
            })
        };
        assert_eq!(map.finish_reverse(from_search, named("Stale County")).unwrap(), Applied::Stale);
        assert_eq!(map.finish_reverse(from_click, named("Providence County")).unwrap(), Applied::Yes);
        assert!(matches!(
            map.popup(),
            Popup::Place { place: Some(place), .. } if place.county == "Providence County"
        ));
    }

    #[test]
    fn stale_search_is_dropped() {
        let mut map = MapSession::new();
        let slow = map.begin_search();
        let fast = map.begin_search();

        let body = |lon: f64| json!({ "type": "FeatureCollection", "features": [{ "center": [lon, 41.8] }] });
        assert_eq!(map.finish_search(fast, Ok(body(-71.0))).unwrap(), Applied::Yes);
        assert_eq!(map.finish_search(slow, Ok(body(-72.0))).unwrap(), Applied::Stale);
        assert!((map.view().longitude - -71.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stale_error_is_swallowed() {
        let mut map = MapSession::new();
        let old = map.begin_search();
        let _new = map.begin_search();

        let result = map.finish_search(old, Err(ClientError::Status { status: 502 }));
        assert_eq!(result.unwrap(), Applied::Stale);
    }

    #[test]
    fn search_without_features_is_unexpected_shape() {
        let mut map = MapSession::new();
        let token = map.begin_search();
        let err = map
            .finish_search(token, Ok(json!({ "message": "Not Authorized" })))
            .unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape { .. }));
        assert_eq!(map.view(), ViewState::default());
    }

    #[tokio::test]
    async fn redlining_refresh_uses_current_bbox() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        map.set_bbox(BoundingBox::new(41.7, 41.9, -71.5, -71.3));

        map.refresh_redlining(&backend).await.unwrap();
        assert_eq!(
            backend.last_bbox(),
            Some(BoundingBox::new(41.7, 41.9, -71.5, -71.3))
        );
        assert!(map.redlining().is_some());
    }

    #[tokio::test]
    async fn hazard_is_placed_at_view_center_and_panel_closes() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        map.toggle_panel(PanelKind::HazardReport);
        map.panel_mut()
            .hazard_draft_mut()
            .unwrap()
            .push_str("Icy sidewalk");

        let marker = map.submit_hazard(&backend).await.unwrap();
        assert_eq!(marker.location, ViewState::default().center());
        assert_eq!(map.hazards().len(), 1);
        assert_eq!(map.panel(), &ActivePanel::Closed);
        assert_eq!(backend.reported_hazards(), 1);
    }

    #[tokio::test]
    async fn blank_hazard_is_ignored() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        map.toggle_panel(PanelKind::HazardReport);
        map.panel_mut().hazard_draft_mut().unwrap().push_str("  ");

        assert!(map.submit_hazard(&backend).await.is_none());
        assert!(map.hazards().is_empty());
        assert!(map.panel().is_open(PanelKind::HazardReport));
    }

    #[tokio::test]
    async fn failed_hazard_post_keeps_marker() {
        let backend = FakeBackend::offline();
        let mut map = MapSession::new();
        map.toggle_panel(PanelKind::HazardReport);
        map.panel_mut().hazard_draft_mut().unwrap().push_str("Downed tree");

        assert!(map.submit_hazard(&backend).await.is_some());
        assert_eq!(map.hazards().len(), 1);
    }

    #[tokio::test]
    async fn clicking_a_hazard_shows_it() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        map.set_view(ViewState::fly_to(LngLat::new(-71.4102, 41.8232), 14.0));
        map.toggle_panel(PanelKind::HazardReport);
        map.panel_mut().hazard_draft_mut().unwrap().push_str("Pothole");
        let marker = map.submit_hazard(&backend).await.unwrap();

        // A few metres away, same grid cell.
        let near = LngLat::new(
            marker.location.longitude + 0.0001,
            marker.location.latitude - 0.0001,
        );
        map.click(&backend, near).await.unwrap();
        assert_eq!(map.popup(), &Popup::Hazard(marker));
        assert_eq!(backend.reverse_calls(), 0);
    }

    #[tokio::test]
    async fn route_pins_are_clickable() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        map.start = "Brown University".to_string();
        map.destination = "Federal Hill".to_string();

        assert_eq!(
            map.generate_safest_route(&backend).await.unwrap(),
            Some(Applied::Yes)
        );
        assert_eq!(map.previous_routes()[0].end, "Federal Hill");

        let pin = brown_pin();
        map.click(&backend, pin.location()).await.unwrap();
        assert_eq!(map.popup(), &Popup::SafetyPin(pin));
    }

    #[tokio::test]
    async fn blank_route_inputs_do_not_fetch() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        map.start = "Brown University".to_string();

        assert_eq!(map.generate_safest_route(&backend).await.unwrap(), None);
    }

    #[tokio::test]
    async fn miss_is_reverse_geocoded() {
        let backend = FakeBackend::default();
        let mut map = MapSession::new();
        let click = LngLat::new(-71.5, 41.7);

        map.click(&backend, click).await.unwrap();
        assert_eq!(
            map.popup(),
            &Popup::Place {
                location: click,
                place: Some(PlaceName {
                    county: "Providence County".to_string(),
                    state: "Rhode Island".to_string(),
                }),
            }
        );
    }

    #[test]
    fn reverse_after_marker_click_is_dropped() {
        let mut map = MapSession::new();
        let token = map.begin_click(LngLat::new(-71.5, 41.7)).unwrap();
        map.close_popup();

        let result = Ok(ReverseResult {
            latitude: 41.7,
            longitude: -71.5,
            county: "Kent County".to_string(),
            state: "Rhode Island".to_string(),
        });
        assert_eq!(map.finish_reverse(token, result).unwrap(), Applied::Stale);
        assert_eq!(map.popup(), &Popup::Hidden);
    }
}
