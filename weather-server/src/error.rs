//! Mapping of upstream failures onto the proxy's fixed JSON error bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use weather_core::WeatherError;

pub const CITY_NOT_FOUND: &str = "City not found";
pub const WEATHER_FAILED: &str = "Failed to fetch weather data";
pub const FORECAST_FAILED: &str = "Failed to fetch forecast data";

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// An error that is safe to show to clients.
///
/// Constructing one logs the underlying cause; only `message` leaves the process.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    /// Current conditions by city: 404 or 500.
    pub fn weather(err: WeatherError) -> Self {
        Self::classify(err, "Weather API error", WEATHER_FAILED)
    }

    /// Forecast by city: 404 or 500.
    pub fn forecast(err: WeatherError) -> Self {
        Self::classify(err, "Forecast API error", FORECAST_FAILED)
    }

    /// Current conditions by coordinates: always 500.
    pub fn coordinates(err: WeatherError) -> Self {
        tracing::error!("Weather coords API error: {err}");
        Self::internal(WEATHER_FAILED)
    }

    pub fn internal(message: &'static str) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    fn classify(err: WeatherError, label: &str, generic: &'static str) -> Self {
        match err {
            WeatherError::NotFound => {
                tracing::warn!("{label}: upstream reported no matching city");
                Self { status: StatusCode::NOT_FOUND, message: CITY_NOT_FOUND }
            }
            WeatherError::Upstream(cause) => {
                tracing::error!("{label}: {cause:#}");
                Self::internal(generic)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message.to_string() })).into_response()
    }
}
