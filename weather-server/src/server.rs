//! Proxy server wiring: state, routes, middleware and the listener loop.

use anyhow::{Context, Result, anyhow};
use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method, Uri},
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::{ServiceBuilder, timeout::error::Elapsed};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use weather_core::{Config, ServerConfig, WeatherError, WeatherProvider, provider_from_config};

use crate::{error::ApiError, handlers};

/// Shared, read-only state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

/// Routes of the proxy, without CORS or timeouts.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/weather/coords/:lat/:lon", get(handlers::current_by_coordinates))
        .route("/api/weather/:city", get(handlers::current_by_city))
        .route("/api/forecast/:city", get(handlers::forecast_by_city))
        .route("/api/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application: routes plus request timeout and CORS.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    router(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(Duration::from_secs(config.request_timeout_secs)),
        )
        .layer(create_cors_layer(config))
}

/// A timed-out request is an upstream failure of the route it interrupted.
async fn handle_middleware_error(uri: Uri, err: BoxError) -> ApiError {
    let cause = if err.is::<Elapsed>() {
        anyhow!("request to {} timed out", uri.path())
    } else {
        anyhow!("middleware error on {}: {err}", uri.path())
    };

    if uri.path().starts_with("/api/forecast/") {
        ApiError::forecast(WeatherError::Upstream(cause))
    } else {
        ApiError::weather(WeatherError::Upstream(cause))
    }
}

pub fn create_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET]).allow_headers(Any);

    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the provider (failing fast without an API key), bind, and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let provider: Arc<dyn WeatherProvider> = provider_from_config(&config)?.into();
    let app = app(AppState::new(provider), &config.server);

    let addr: SocketAddr = config
        .server
        .address()
        .parse()
        .with_context(|| format!("Invalid server address '{}'", config.server.address()))?;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind TCP listener to {}: {}", addr, e);
            return Err(e).context("Check whether the port is already in use");
        }
    };

    info!("Weather API server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    info!("Weather API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

pub fn print_routes() {
    println!("GET /api/weather/:city            current conditions by city name");
    println!("GET /api/forecast/:city           5-day / 3-hour forecast by city name");
    println!("GET /api/weather/coords/:lat/:lon current conditions by coordinates");
    println!("GET /api/health                   liveness");
}
