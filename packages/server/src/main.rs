#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone SafeTravels API server binary.

use safe_travels_server::{ServerConfig, run_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;
    run_server(config).await
}
