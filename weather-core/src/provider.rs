use crate::{
    Config, Coordinates, CurrentConditions, Forecast, WeatherError,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Source of reshaped weather data.
///
/// Implementations classify failures themselves: `NotFound` only when the
/// upstream explicitly reports an unknown city, `Upstream` for anything else.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_by_city(&self, city: &str) -> Result<CurrentConditions, WeatherError>;

    async fn forecast_by_city(&self, city: &str) -> Result<Forecast, WeatherError>;

    /// Any coordinate resolves to some station, so this never yields `NotFound`.
    async fn current_by_coordinates(
        &self,
        at: Coordinates,
    ) -> Result<CurrentConditions, WeatherError>;
}

/// Construct the upstream provider from config.
///
/// Fails when no API key is configured, so a misconfigured proxy stops at
/// startup instead of answering every request with an upstream error.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    let provider = OpenWeatherProvider::with_base_url(
        api_key.to_owned(),
        config.openweather.base_url.clone(),
        Duration::from_secs(config.openweather.timeout_secs),
    )?;

    Ok(Box::new(provider))
}
