use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    WeatherError,
    config::DEFAULT_OPENWEATHER_URL,
    model::{Coordinates, CurrentConditions, Forecast, ForecastEntry},
};

use super::WeatherProvider;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_OPENWEATHER_URL.to_string(), DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build OpenWeather HTTP client")?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    /// GET `{base_url}/{endpoint}` in metric units and return the raw body.
    ///
    /// An upstream 404 becomes `NotFound`; every other failure is `Upstream`.
    async fn fetch_body(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<String, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        tracing::debug!(endpoint, ?query, "requesting OpenWeather {what}");

        // without_url(): the request URL carries the API key.
        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("OpenWeather {what} request returned 404: {}", truncate_body(&body));
            return Err(WeatherError::NotFound);
        }

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            )
            .into());
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_city(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        let body = self.fetch_body("weather", &[("q", city.to_string())], "current weather").await?;
        Ok(reshape_current(&body)?)
    }

    async fn forecast_by_city(&self, city: &str) -> Result<Forecast, WeatherError> {
        let body = self.fetch_body("forecast", &[("q", city.to_string())], "5-day forecast").await?;
        Ok(reshape_forecast(&body)?)
    }

    async fn current_by_coordinates(
        &self,
        at: Coordinates,
    ) -> Result<CurrentConditions, WeatherError> {
        let query = [("lat", at.latitude.to_string()), ("lon", at.longitude.to_string())];

        let body = self
            .fetch_body("weather", &query, "current weather by coordinates")
            .await
            .map_err(|e| match e {
                WeatherError::NotFound => {
                    WeatherError::Upstream(anyhow!("OpenWeather returned 404 for coordinates {at}"))
                }
                other => other,
            })?;

        Ok(reshape_current(&body)?)
    }
}

/// Map a raw OpenWeather "current weather" body to [`CurrentConditions`].
pub fn reshape_current(body: &str) -> Result<CurrentConditions> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;

    CurrentConditions::try_from(parsed)
}

/// Map a raw OpenWeather "5 day / 3 hour" body to [`Forecast`], keeping upstream order.
pub fn reshape_forecast(body: &str) -> Result<Forecast> {
    let parsed: OwForecastResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather forecast JSON")?;

    Forecast::try_from(parsed)
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    // Absent for coordinates outside any country (open sea).
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    /// Metres.
    visibility: Option<f64>,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastItem>,
}

impl TryFrom<OwCurrentResponse> for CurrentConditions {
    type Error = anyhow::Error;

    fn try_from(raw: OwCurrentResponse) -> Result<Self> {
        let condition = primary_condition(raw.weather)?;

        Ok(CurrentConditions {
            city: raw.name,
            country: raw.sys.country,
            temperature: round_half_up(raw.main.temp),
            description: condition.description,
            icon: condition.icon,
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
            wind_speed: raw.wind.speed,
            feels_like: round_half_up(raw.main.feels_like),
            visibility: raw.visibility.map(|m| m / 1000.0),
            sunrise: unix_to_utc(raw.sys.sunrise)?,
            sunset: unix_to_utc(raw.sys.sunset)?,
        })
    }
}

impl TryFrom<OwForecastResponse> for Forecast {
    type Error = anyhow::Error;

    fn try_from(raw: OwForecastResponse) -> Result<Self> {
        let forecast = raw
            .list
            .into_iter()
            .map(|item| {
                let condition = primary_condition(item.weather)?;
                Ok(ForecastEntry {
                    date: unix_to_utc(item.dt)?,
                    temperature: round_half_up(item.main.temp),
                    description: condition.description,
                    icon: condition.icon,
                    humidity: item.main.humidity,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Forecast { city: raw.city.name, country: raw.city.country, forecast })
    }
}

fn primary_condition(weather: Vec<OwWeather>) -> Result<OwWeather> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("OpenWeather response contained no weather condition"))
}

/// Round to the nearest integer, halves toward positive infinity (-2.5 -> -2).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("Timestamp {ts} is out of range"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
