//! Core library for the weather proxy and its terminal client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the upstream weather provider
//! - Shared domain models and the reshaping of upstream payloads into them
//!
//! It is used by `weather-server` (the proxy) and `weather-cli` (the client),
//! which share the model types so conversions happen exactly once.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{ClientConfig, Config, ProviderConfig, ServerConfig};
pub use error::WeatherError;
pub use model::{Coordinates, CurrentConditions, Forecast, ForecastEntry, HealthStatus};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
