//! Fixed-step coordinate grid used for click matching.
//!
//! A map click almost never lands on the exact coordinates of a stored
//! marker, so both points are snapped onto a grid of
//! [`MATCH_GRID_DEGREES`] cells and compared by integer cell index.
//!
//! One cell is 0.001° on each axis: roughly 111 m of latitude anywhere,
//! and 111 m × cos(latitude) of longitude (about 83 m in Providence).

use safe_travels_geo_models::LngLat;

/// Size of one grid cell in degrees.
pub const MATCH_GRID_DEGREES: f64 = 0.001;

/// Integer grid cell containing a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Longitude cell index.
    pub x: i64,
    /// Latitude cell index.
    pub y: i64,
}

impl GridCell {
    /// Snaps `point` to the nearest cell of the default grid.
    #[must_use]
    pub fn of(point: LngLat) -> Self {
        Self::with_step(point, MATCH_GRID_DEGREES)
    }

    /// Snaps `point` to the nearest cell of a grid with `step` degrees.
    #[must_use]
    pub fn with_step(point: LngLat, step: f64) -> Self {
        Self {
            x: snap(point.longitude, step),
            y: snap(point.latitude, step),
        }
    }
}

// Coordinates are bounded by ±180°, so the quotient always fits in an i64.
#[allow(clippy::cast_possible_truncation)]
fn snap(value: f64, step: f64) -> i64 {
    (value / step).round() as i64
}

/// Whether `a` and `b` fall in the same cell of the default grid.
#[must_use]
pub fn same_cell(a: LngLat, b: LngLat) -> bool {
    GridCell::of(a) == GridCell::of(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_points_share_a_cell() {
        let marker = LngLat::new(-71.402_2, 41.826_1);
        let click = LngLat::new(-71.402_4, 41.826_3);
        assert!(same_cell(marker, click));
    }

    #[test]
    fn points_one_cell_apart_do_not_match() {
        let marker = LngLat::new(-71.402, 41.826);
        let click = LngLat::new(-71.403, 41.826);
        assert!(!same_cell(marker, click));
    }

    #[test]
    fn rounding_boundary_splits_close_points() {
        // 0.0004 apart but on opposite sides of a half-cell boundary.
        let a = LngLat::new(-71.400_3, 41.826);
        let b = LngLat::new(-71.400_7, 41.826);
        assert!(!same_cell(a, b));
    }

    #[test]
    fn negative_coordinates_snap_symmetrically() {
        let cell = GridCell::of(LngLat::new(-71.402_4, -41.826_6));
        assert_eq!(cell, GridCell { x: -71_402, y: -41_827 });
    }

    #[test]
    fn coarser_grid_widens_tolerance() {
        let a = LngLat::new(-71.402, 41.826);
        let b = LngLat::new(-71.404, 41.828);
        assert_ne!(GridCell::of(a), GridCell::of(b));
        assert_eq!(GridCell::with_step(a, 0.01), GridCell::with_step(b, 0.01));
    }
}
