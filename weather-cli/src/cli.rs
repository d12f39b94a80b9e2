use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use std::{io::Write, path::PathBuf, time::Duration};
use weather_core::Config;

use weather_cli::{
    FixedLocation, ForecastWindow, ProxyApi, ProxyClient, Session, ViewState,
    render::{self, render},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Configuration file; defaults to the platform config directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the weather proxy, e.g. http://localhost:5000/api.
    #[arg(long, global = true, value_name = "URL")]
    pub proxy_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the API key, proxy URL and default city.
    Configure,

    /// Show weather for a city.
    Show {
        city: String,

        /// One forecast entry per day instead of the next five slots.
        #[arg(long)]
        daily: bool,
    },

    /// Show weather for a location, falling back to the default city.
    Here {
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        #[arg(long)]
        daily: bool,
    },

    /// Prompt for cities until Esc or Ctrl-C.
    Interactive {
        #[arg(long)]
        daily: bool,
    },

    /// Keep the display open with a live clock until Ctrl-C.
    Watch {
        /// City to show; the default city when omitted.
        city: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        // Saved as loaded: environment overrides must not leak into the file.
        if let Command::Configure = self.command {
            return configure(config, self.config);
        }

        config.apply_env()?;
        if let Some(url) = self.proxy_url {
            config.client.proxy_url = url;
        }

        match self.command {
            Command::Configure => Ok(()),
            Command::Show { city, daily } => {
                if city.trim().is_empty() {
                    bail!("City name must not be empty");
                }
                let mut session = session(&config, ForecastWindow::from_daily_flag(daily))?;
                session.search(&city).await;
                print_once(session.state())
            }
            Command::Here { lat, lon, daily } => {
                let mut session = session(&config, ForecastWindow::from_daily_flag(daily))?;
                session.initialize(&FixedLocation::from_args(lat, lon)).await;
                print_once(session.state())
            }
            Command::Interactive { daily } => {
                let session = session(&config, ForecastWindow::from_daily_flag(daily))?;
                interactive(session).await
            }
            Command::Watch { city } => {
                let session = session(&config, ForecastWindow::Slots)?;
                watch(session, city).await
            }
        }
    }
}

fn session(config: &Config, window: ForecastWindow) -> anyhow::Result<Session<ProxyClient>> {
    let client = ProxyClient::new(&config.client.proxy_url)?;
    Ok(Session::new(client, config.client.default_city.clone(), window))
}

fn print_once(state: &ViewState) -> anyhow::Result<()> {
    if let Some(error) = &state.error {
        bail!("{error}");
    }
    print!("{}", render(state, false));
    Ok(())
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Used by weather-server; leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    } else if config.api_key().is_err() {
        println!("No API key stored; weather-server will need OPENWEATHER_API_KEY.");
    }

    config.client.proxy_url =
        Text::new("Proxy URL:").with_default(&config.client.proxy_url).prompt()?;
    ProxyClient::new(&config.client.proxy_url)?;

    let city = Text::new("Default city:").with_default(&config.client.default_city).prompt()?;
    if !city.trim().is_empty() {
        config.client.default_city = city.trim().to_string();
    }

    let saved = match path {
        Some(path) => {
            config.save_to(&path)?;
            path
        }
        None => config.save()?,
    };

    println!("Configuration saved to {}", saved.display());
    Ok(())
}

async fn interactive<A: ProxyApi>(mut session: Session<A>) -> anyhow::Result<()> {
    loop {
        let answer = tokio::task::spawn_blocking(|| {
            Text::new("City:").with_help_message("Esc or Ctrl-C to quit").prompt()
        })
        .await
        .context("Prompt task failed")?;

        let city = match answer {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        session.tick(Local::now());
        session.search(&city).await;
        print!("{}", render(session.state(), true));
    }
}

async fn watch<A: ProxyApi>(mut session: Session<A>, city: Option<String>) -> anyhow::Result<()> {
    match city {
        Some(city) => session.search(&city).await,
        None => session.initialize(&FixedLocation::unavailable()).await,
    }

    let mut clock = tokio::time::interval(Duration::from_secs(1));
    let mut stdout = std::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = clock.tick() => {
                session.tick(Local::now());
                // Clear screen, cursor home.
                write!(stdout, "\x1b[2J\x1b[H{}", render(session.state(), true))?;
                stdout.flush()?;
            }
            signal = &mut ctrl_c => {
                writeln!(stdout)?;
                return signal.context("Failed to listen for Ctrl-C");
            }
        }
    }
}
