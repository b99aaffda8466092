//! Subcommand implementations.
//!
//! Each client command drives the same session types the map front end
//! uses and prints what the map would show.

use safe_travels_client::{
    Backend, BackendClient, ClientError, CredentialsForm, MapSession, PanelKind, Popup,
    SessionGate, SessionState,
};
use safe_travels_geo_models::{BoundingBox, LngLat, SafetyRecord, ViewState};
use safe_travels_server::ServerConfig;

/// Runs the API server on actix's own runtime.
pub async fn serve(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    log::debug!("Server config: {config:?}");

    // The server uses actix-web's runtime, so it runs in a blocking task
    // to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if interactive {
                safe_travels_server::interactive::run(config).await
            } else {
                safe_travels_server::run_server(config).await
            }
        })
    })
    .await??;

    Ok(())
}

pub async fn login(backend: &BackendClient, username: String, password: String) -> bool {
    let mut gate = SessionGate::new();
    gate.login_form = CredentialsForm { username, password };

    let logged_in = gate.submit_login(backend).await;
    match gate.state() {
        SessionState::LoggedIn { username } => {
            println!("Logged in as {username}");
        }
        SessionState::LoggedOut => {
            println!("{}", gate.message().unwrap_or_default());
        }
    }
    logged_in
}

pub async fn register(backend: &BackendClient, username: String, password: String) -> bool {
    let mut gate = SessionGate::new();
    gate.register_form = CredentialsForm { username, password };

    let created = gate.submit_register(backend).await;
    println!("{}", gate.message().unwrap_or_default());
    created
}

pub async fn search(backend: &BackendClient, place: &str) -> Result<(), ClientError> {
    let mut map = MapSession::new();
    map.search(backend, place).await?;

    let view = map.view();
    println!(
        "Flying to ({:.4}, {:.4}) at zoom {}",
        view.latitude, view.longitude, view.zoom
    );
    println!("{}", describe_popup(map.popup()));

    if let Some(features) = map
        .search_results()
        .and_then(|body| body["features"].as_array())
    {
        for feature in features.iter().take(5) {
            if let Some(name) = feature["place_name"].as_str() {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

pub async fn reverse(backend: &BackendClient, point: LngLat) -> Result<(), ClientError> {
    let mut map = MapSession::new();
    map.click(backend, point).await?;
    println!("{}", describe_popup(map.popup()));
    Ok(())
}

pub async fn route(backend: &BackendClient, start: String, end: String) -> Result<(), ClientError> {
    let mut map = MapSession::new();
    map.start = start;
    map.destination = end;

    if map.generate_safest_route(backend).await?.is_none() {
        println!("Start and destination are both required.");
        return Ok(());
    }

    let pins = map.safety_pins();
    if pins.is_empty() {
        println!("No safety data along this route.");
        return Ok(());
    }

    println!(
        "{:<30} {:>7} {:>6} {:>6} {:>6} {:>8} {:>9} {:>6}",
        "NEIGHBORHOOD", "OVERALL", "LGBTQ", "MEDIC", "THEFT", "PHYSICAL", "POLITICAL", "WOMEN"
    );
    println!("{}", "-".repeat(86));
    for pin in pins {
        println!("{}", score_row(pin));
    }
    println!("\n{} neighborhood(s)", pins.len());
    Ok(())
}

pub async fn redlining(backend: &BackendClient, bbox: BoundingBox) -> Result<(), ClientError> {
    let mut map = MapSession::new();
    map.set_bbox(bbox);
    map.refresh_redlining(backend).await?;

    let count = map.redlining().map_or(0, |c| c.features.len());
    println!("{count} redlining feature(s) inside the box");
    Ok(())
}

pub async fn report_hazard(backend: &BackendClient, point: LngLat, title: &str) {
    let mut map = MapSession::new();
    map.set_view(ViewState::fly_to(point, ViewState::INITIAL_ZOOM));
    map.toggle_panel(PanelKind::HazardReport);
    if let Some(draft) = map.panel_mut().hazard_draft_mut() {
        draft.push_str(title);
    }

    match map.submit_hazard(backend).await {
        Some(marker) => println!(
            "Reported '{}' at ({:.4}, {:.4})",
            marker.title, marker.location.latitude, marker.location.longitude
        ),
        None => println!("A hazard description is required."),
    }
}

pub async fn list_hazards(backend: &BackendClient) -> Result<(), ClientError> {
    let mut map = MapSession::new();
    let count = map.sync_hazards(backend).await?;

    for hazard in map.hazards() {
        println!(
            "({:.4}, {:.4})  {}",
            hazard.location.latitude, hazard.location.longitude, hazard.title
        );
    }
    println!("\n{count} hazard(s)");
    Ok(())
}

pub async fn history(backend: &BackendClient) -> Result<(), ClientError> {
    let history = backend.history().await?;

    println!("Recent searches:");
    if history.searches.is_empty() {
        println!("  (none)");
    }
    for place in &history.searches {
        println!("  {place}");
    }

    println!("\nRecent routes:");
    if history.routes.is_empty() {
        println!("  (none)");
    }
    for route in &history.routes {
        println!(
            "  {}  {} -> {}",
            route.date_time.format("%Y-%m-%d %H:%M"),
            route.start,
            route.end
        );
    }
    Ok(())
}

pub async fn click(
    backend: &BackendClient,
    point: LngLat,
    route: Option<(String, String)>,
) -> Result<(), ClientError> {
    let mut map = MapSession::new();
    map.sync_hazards(backend).await?;

    if let Some((start, end)) = route {
        map.start = start;
        map.destination = end;
        map.generate_safest_route(backend).await?;
    }

    map.click(backend, point).await?;
    println!("{}", describe_popup(map.popup()));
    Ok(())
}

fn score_row(pin: &SafetyRecord) -> String {
    let s = pin.safety_scores;
    format!(
        "{:<30} {:>7} {:>6} {:>6} {:>6} {:>8} {:>9} {:>6}",
        pin.name,
        s.overall,
        s.lgbtq,
        s.medical,
        s.theft,
        s.physical_harm,
        s.political_freedom,
        s.women
    )
}

fn describe_popup(popup: &Popup) -> String {
    match popup {
        Popup::Hidden => "Nothing to show".to_string(),
        Popup::Hazard(hazard) => format!("Hazard: {}", hazard.title),
        Popup::SafetyPin(pin) => format!(
            "{} (overall safety {}, women {}, theft {})",
            pin.name, pin.safety_scores.overall, pin.safety_scores.women, pin.safety_scores.theft
        ),
        Popup::Place {
            location,
            place: Some(place),
        } => format!(
            "{}, {} ({:.4}, {:.4})",
            place.county, place.state, location.latitude, location.longitude
        ),
        Popup::Place {
            location,
            place: None,
        } => format!(
            "Unknown place ({:.4}, {:.4})",
            location.latitude, location.longitude
        ),
    }
}

#[cfg(test)]
mod tests {
    use safe_travels_geo_models::{HazardMarker, PlaceName};

    use super::*;

    #[test]
    fn describes_resolved_place() {
        let popup = Popup::Place {
            location: LngLat::new(-71.4, 41.8),
            place: Some(PlaceName {
                county: "Providence County".to_string(),
                state: "Rhode Island".to_string(),
            }),
        };
        assert_eq!(
            describe_popup(&popup),
            "Providence County, Rhode Island (41.8000, -71.4000)"
        );
    }

    #[test]
    fn describes_hazard() {
        let popup = Popup::Hazard(HazardMarker {
            location: LngLat::new(-71.4, 41.8),
            title: "Broken glass".to_string(),
        });
        assert_eq!(describe_popup(&popup), "Hazard: Broken glass");
    }
}
