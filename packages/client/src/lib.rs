#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client core for SafeTravels.
//!
//! Everything the map front end decides on its own, without drawing
//! anything: the login/registration gate, which panel and popup are open,
//! which marker a click landed on, and whether a late response is still
//! wanted. All data comes from the SafeTravels server through the
//! [`Backend`] trait; [`BackendClient`] is its HTTP implementation.

pub mod api;
pub mod map;
pub mod panel;
pub mod request_token;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{Backend, BackendClient, ClientError};
pub use map::{Applied, MapSession};
pub use panel::{ActivePanel, PanelKind, Popup};
pub use request_token::{Channel, RequestToken, RequestTracker};
pub use session::{CredentialsForm, SessionGate, SessionState};
