#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry helpers for SafeTravels.
//!
//! - [`grid`] snaps coordinates onto a fixed-degree grid so that a map
//!   click can be compared against stored markers without float equality.
//! - [`matcher`] resolves a click to a hazard marker or safety pin.
//! - [`redlining`] filters the historical redlining overlay to a bounding
//!   box.
//! - [`route`] computes the midpoint and search radius between two
//!   endpoints.
//! - [`features`] converts hazard markers to and from `GeoJSON` features.

pub mod features;
pub mod grid;
pub mod matcher;
pub mod redlining;
pub mod route;

use thiserror::Error;

/// Errors from geometry operations on `GeoJSON` input.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The input was valid JSON but not the expected `GeoJSON` shape.
    #[error("Unexpected GeoJSON: {message}")]
    Shape {
        /// Description of the mismatch.
        message: String,
    },

    /// The input could not be parsed as `GeoJSON` at all.
    #[error("GeoJSON parse error: {0}")]
    Parse(#[from] geojson::Error),
}
