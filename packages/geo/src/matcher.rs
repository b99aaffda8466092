//! Resolves a map click to the marker underneath it.
//!
//! Hazards are scanned first, then safety pins; the first record whose
//! grid cell equals the click's cell wins. Marker counts stay in the tens,
//! so a linear scan per click is enough.

use safe_travels_geo_models::{HazardMarker, LngLat, SafetyRecord};

use crate::grid::GridCell;

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickMatch<'a> {
    /// A user-reported hazard.
    Hazard(&'a HazardMarker),
    /// A neighborhood safety pin.
    SafetyPin(&'a SafetyRecord),
    /// Nothing; the caller falls back to reverse geocoding.
    Miss,
}

impl ClickMatch<'_> {
    /// Whether the click hit a marker.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        !matches!(self, Self::Miss)
    }
}

/// Finds the hazard or safety pin in the same grid cell as `click`.
#[must_use]
pub fn match_click<'a>(
    click: LngLat,
    hazards: &'a [HazardMarker],
    pins: &'a [SafetyRecord],
) -> ClickMatch<'a> {
    let cell = GridCell::of(click);

    if let Some(hazard) = hazards.iter().find(|h| GridCell::of(h.location) == cell) {
        return ClickMatch::Hazard(hazard);
    }

    if let Some(pin) = pins.iter().find(|p| GridCell::of(p.location()) == cell) {
        return ClickMatch::SafetyPin(pin);
    }

    log::trace!(
        "No marker at ({}, {}) among {} hazards and {} pins",
        click.longitude,
        click.latitude,
        hazards.len(),
        pins.len()
    );
    ClickMatch::Miss
}
