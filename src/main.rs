use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vesseltrack::config::Config;
use vesseltrack::error::Categorized;
use vesseltrack::models::NewDevice;

mod commands;

#[derive(Parser)]
#[command(
    name = "vesseltrack",
    version,
    about = "Vessel registry and position service backed by remote telemetry channels",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "VESSELTRACK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Manage registered devices
    Devices {
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Print the last known position of one ship
    Locate {
        /// Ship name (case-insensitive)
        ship_name: String,
    },

    /// Print the last known position of every registered ship
    LocateAll,

    /// Print current weather at a coordinate
    Weather {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Subcommand)]
enum DeviceAction {
    /// List registered devices
    List,

    /// Register a device
    Add {
        /// Ship name
        #[arg(long)]
        ship_name: String,

        /// Owner name
        #[arg(long)]
        owner_name: String,

        /// Provider channel id
        #[arg(long)]
        channel_id: String,

        /// Provider read key
        #[arg(long)]
        read_key: String,
    },

    /// Show one device
    Show {
        /// Device id
        id: i64,
    },

    /// Remove a device
    Remove {
        /// Device id
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // CLI flag wins over configuration
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting serve command");
            commands::serve(config, bind).await?;
        }

        Commands::Devices { action } => match action {
            DeviceAction::List => report(commands::list_devices(&config))?,
            DeviceAction::Add {
                ship_name,
                owner_name,
                channel_id,
                read_key,
            } => {
                let device = NewDevice::new(ship_name, owner_name, read_key, channel_id);
                report(commands::add_device(&config, device))?;
            }
            DeviceAction::Show { id } => report(commands::show_device(&config, id))?,
            DeviceAction::Remove { id } => report(commands::remove_device(&config, id))?,
        },

        Commands::Locate { ship_name } => {
            tracing::info!(ship_name = %ship_name, "Starting locate command");
            report(commands::locate(&config, &ship_name).await)
                .with_context(|| format!("Failed to locate {ship_name}"))?;
        }

        Commands::LocateAll => {
            tracing::info!("Starting locate-all command");
            report(commands::locate_all(&config).await)?;
        }

        Commands::Weather { lat, lon } => {
            tracing::info!(lat = %lat, lon = %lon, "Starting weather command");
            report(commands::weather(&config, lat, lon).await).context("Weather lookup failed")?;
        }
    }

    Ok(())
}

/// Log the category of a failed command; transient failures get a retry hint
fn report(result: vesseltrack::error::Result<()>) -> Result<()> {
    result.map_err(|err| {
        tracing::debug!(category = %err.category(), error = %err, "Command failed");
        if err.is_transient() {
            anyhow::Error::new(err).context("Provider unavailable, try again later")
        } else {
            anyhow::Error::new(err)
        }
    })
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("vesseltrack=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| {
                tracing_subscriber::EnvFilter::try_new(format!("vesseltrack={level},warn"))
            })
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
