//! Interactive mode for the server.
//!
//! Prompts the user for bind address and port before starting the server.

use dialoguer::{Confirm, Input};

use crate::ServerConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Starts from `config`, lets the user override the bind address and
/// port, and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: ServerConfig) -> std::io::Result<()> {
    println!("SafeTravels Server");
    println!();

    config.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.bind_addr.clone())
        .interact_text()
        .unwrap_or(config.bind_addr);

    config.port = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()
        .unwrap_or(config.port);

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.bind_addr, config.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
