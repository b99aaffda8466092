//! Which side panel and which popup are showing.
//!
//! At most one panel and one popup exist at a time.

use safe_travels_geo::matcher::ClickMatch;
use safe_travels_geo_models::{HazardMarker, LngLat, PlaceName, SafetyRecord};

/// The panels that can be toggled open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// "Report A Hazard".
    HazardReport,
    /// "Access Previously Viewed Routes".
    PreviousRoutes,
}

/// The open side panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActivePanel {
    /// No panel is open.
    #[default]
    Closed,
    /// The hazard report input, with what has been typed so far.
    HazardReport {
        /// Hazard description being typed.
        draft: String,
    },
    /// The list of previously generated routes.
    PreviousRoutes,
}

impl ActivePanel {
    /// Which panel is open, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<PanelKind> {
        match self {
            Self::Closed => None,
            Self::HazardReport { .. } => Some(PanelKind::HazardReport),
            Self::PreviousRoutes => Some(PanelKind::PreviousRoutes),
        }
    }

    /// Whether `kind` is the open panel.
    #[must_use]
    pub fn is_open(&self, kind: PanelKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Opens `kind`, or closes it if it is already open. Opening one
    /// panel closes the other.
    pub fn toggle(&mut self, kind: PanelKind) {
        *self = if self.is_open(kind) {
            Self::Closed
        } else {
            match kind {
                PanelKind::HazardReport => Self::HazardReport {
                    draft: String::new(),
                },
                PanelKind::PreviousRoutes => Self::PreviousRoutes,
            }
        };
    }

    /// The hazard draft, when the hazard panel is open.
    pub const fn hazard_draft_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::HazardReport { draft } => Some(draft),
            _ => None,
        }
    }
}

/// The popup anchored on the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Popup {
    /// Nothing is shown.
    #[default]
    Hidden,
    /// A clicked hazard.
    Hazard(HazardMarker),
    /// A clicked safety pin.
    SafetyPin(SafetyRecord),
    /// A clicked spot with no marker. `place` is filled in once reverse
    /// geocoding answers.
    Place {
        /// Where the user clicked.
        location: LngLat,
        /// County and state, when known.
        place: Option<PlaceName>,
    },
}

impl Popup {
    /// The popup for a click match. A miss becomes an unresolved
    /// [`Popup::Place`] at `click`.
    #[must_use]
    pub fn for_click(click: LngLat, hit: ClickMatch<'_>) -> Self {
        match hit {
            ClickMatch::Hazard(hazard) => Self::Hazard(hazard.clone()),
            ClickMatch::SafetyPin(pin) => Self::SafetyPin(pin.clone()),
            ClickMatch::Miss => Self::Place {
                location: click,
                place: None,
            },
        }
    }
}
