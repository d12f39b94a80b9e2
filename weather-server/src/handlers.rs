//! Route handlers. Each one is a thin adapter over [`WeatherProvider`].

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use weather_core::{Coordinates, CurrentConditions, Forecast, HealthStatus, WeatherError};

use crate::{
    error::{ApiError, WEATHER_FAILED},
    server::AppState,
};

/// `GET /api/weather/:city`
pub async fn current_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<CurrentConditions>, ApiError> {
    tracing::info!(%city, "current weather request");

    if city.trim().is_empty() {
        return Err(ApiError::weather(WeatherError::NotFound));
    }

    let current = state.provider.current_by_city(&city).await.map_err(ApiError::weather)?;
    Ok(Json(current))
}

/// `GET /api/forecast/:city`
pub async fn forecast_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<Forecast>, ApiError> {
    tracing::info!(%city, "forecast request");

    if city.trim().is_empty() {
        return Err(ApiError::forecast(WeatherError::NotFound));
    }

    let forecast = state.provider.forecast_by_city(&city).await.map_err(ApiError::forecast)?;
    Ok(Json(forecast))
}

/// `GET /api/weather/coords/:lat/:lon`
pub async fn current_by_coordinates(
    State(state): State<AppState>,
    Path((lat, lon)): Path<(String, String)>,
) -> Result<Json<CurrentConditions>, ApiError> {
    tracing::info!(%lat, %lon, "current weather by coordinates request");

    let Some(at) = Coordinates::parse(&lat, &lon) else {
        tracing::error!("Weather coords API error: invalid coordinates '{lat}', '{lon}'");
        return Err(ApiError::internal(WEATHER_FAILED));
    };

    let current =
        state.provider.current_by_coordinates(at).await.map_err(ApiError::coordinates)?;
    Ok(Json(current))
}

/// `GET /api/health`; liveness only, never touches the upstream.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok_at(Utc::now()))
}
