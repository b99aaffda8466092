#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for SafeTravels.
//!
//! ```text
//! safe_travels serve [--interactive]
//! safe_travels login <username> [--password <password>]
//! safe_travels register <username> [--password <password>]
//! safe_travels search <place>
//! safe_travels reverse <lon> <lat>
//! safe_travels route <start> <end>
//! safe_travels redlining <min-lat> <max-lat> <min-lon> <max-lon>
//! safe_travels hazard report <lon> <lat> <title>
//! safe_travels hazard list
//! safe_travels history
//! safe_travels click <lon> <lat> [--start <start> --end <end>]
//! ```
//!
//! Running `safe_travels` with no subcommand enters interactive mode.
//! Client subcommands talk to the server at `SAFE_TRAVELS_SERVER`.

mod commands;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password, Select};
use safe_travels_client::BackendClient;
use safe_travels_geo_models::{BoundingBox, LngLat};

#[derive(Parser)]
#[command(name = "safe_travels", about = "Safety-aware travel map")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Prompt for bind address and port
        #[arg(long)]
        interactive: bool,
    },
    /// Log in to the server
    Login {
        /// Account name
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        /// Account name
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Find a place and show where the map would fly to
    Search {
        /// Place name
        place: String,
    },
    /// Show the county and state at a point
    #[command(allow_negative_numbers = true)]
    Reverse {
        /// Longitude
        lon: f64,
        /// Latitude
        lat: f64,
    },
    /// Show neighborhood safety scores along a route
    Route {
        /// Start address
        start: String,
        /// Destination address
        end: String,
    },
    /// Count redlining features inside a bounding box
    #[command(allow_negative_numbers = true)]
    Redlining {
        /// Southern latitude
        min_lat: f64,
        /// Northern latitude
        max_lat: f64,
        /// Western longitude
        min_lon: f64,
        /// Eastern longitude
        max_lon: f64,
    },
    /// Report or list hazards
    Hazard {
        #[command(subcommand)]
        command: HazardCommands,
    },
    /// Show recent searches and routes
    History,
    /// Show what a map click at a point would display
    #[command(allow_negative_numbers = true)]
    Click {
        /// Longitude
        lon: f64,
        /// Latitude
        lat: f64,
        /// Load safety pins for a route starting here first
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Destination of that route
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
}

#[derive(Subcommand)]
enum HazardCommands {
    /// Report a hazard at a point
    #[command(allow_negative_numbers = true)]
    Report {
        /// Longitude
        lon: f64,
        /// Latitude
        lat: f64,
        /// Description
        title: String,
    },
    /// List reported hazards
    List,
}

/// Entries of the interactive menu.
enum Action {
    Serve,
    Login,
    Register,
    Search,
    Route,
    History,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Serve,
        Self::Login,
        Self::Register,
        Self::Search,
        Self::Route,
        Self::History,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Serve => "Start server",
            Self::Login => "Log in",
            Self::Register => "Register",
            Self::Search => "Search for a place",
            Self::Route => "Generate safest route",
            Self::History => "Show history",
        }
    }
}

fn prompt_password(password: Option<String>) -> Result<String, dialoguer::Error> {
    match password {
        Some(password) => Ok(password),
        None => Password::new().with_prompt("Password").interact(),
    }
}

fn prompt_text(prompt: &str) -> Result<String, dialoguer::Error> {
    Input::new().with_prompt(prompt).interact_text()
}

async fn interactive(backend: &BackendClient) -> Result<(), Box<dyn std::error::Error>> {
    println!("SafeTravels");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Serve => commands::serve(true).await?,
        Action::Login => {
            let username = prompt_text("Username")?;
            commands::login(backend, username, prompt_password(None)?).await;
        }
        Action::Register => {
            let username = prompt_text("Username")?;
            commands::register(backend, username, prompt_password(None)?).await;
        }
        Action::Search => commands::search(backend, &prompt_text("Place")?).await?,
        Action::Route => {
            let start = prompt_text("Start")?;
            let end = prompt_text("Destination")?;
            commands::route(backend, start, end).await?;
        }
        Action::History => commands::history(backend).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let backend = BackendClient::from_env();

    let Some(command) = cli.command else {
        return interactive(&backend).await;
    };

    match command {
        Commands::Serve { interactive } => commands::serve(interactive).await?,
        Commands::Login { username, password } => {
            let password = prompt_password(password)?;
            if !commands::login(&backend, username, password).await {
                std::process::exit(1);
            }
        }
        Commands::Register { username, password } => {
            let password = prompt_password(password)?;
            if !commands::register(&backend, username, password).await {
                std::process::exit(1);
            }
        }
        Commands::Search { place } => commands::search(&backend, &place).await?,
        Commands::Reverse { lon, lat } => {
            commands::reverse(&backend, LngLat::new(lon, lat)).await?;
        }
        Commands::Route { start, end } => commands::route(&backend, start, end).await?,
        Commands::Redlining {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } => {
            let bbox = BoundingBox::new(min_lat, max_lat, min_lon, max_lon);
            commands::redlining(&backend, bbox).await?;
        }
        Commands::Hazard { command } => match command {
            HazardCommands::Report { lon, lat, title } => {
                commands::report_hazard(&backend, LngLat::new(lon, lat), &title).await;
            }
            HazardCommands::List => commands::list_hazards(&backend).await?,
        },
        Commands::History => commands::history(&backend).await?,
        Commands::Click {
            lon,
            lat,
            start,
            end,
        } => {
            let route = start.zip(end);
            commands::click(&backend, LngLat::new(lon, lat), route).await?;
        }
    }

    Ok(())
}
