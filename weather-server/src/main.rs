//! Binary entry point for the weather proxy.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_core::Config;

#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather proxy API server")]
struct Args {
    /// Configuration file; defaults to the platform config directory.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port (takes precedence over PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Print available routes and exit.
    #[arg(long)]
    routes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_server=info,weather_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.routes {
        weather_server::server::print_routes();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let key_from_env =
        std::env::var("OPENWEATHER_API_KEY").is_ok_and(|v| !v.trim().is_empty());
    config.apply_env()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Fail before binding when the key is missing.
    config.api_key()?;
    if key_from_env {
        info!("Using OpenWeather API key from OPENWEATHER_API_KEY");
    } else {
        info!("Using OpenWeather API key from config file");
    }

    info!("Starting weather-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Upstream: {}", config.openweather.base_url);

    weather_server::serve(config).await
}
