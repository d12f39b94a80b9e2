//! Weather proxy service.
//!
//! Receives a city name or coordinate pair, calls the upstream provider through
//! [`weather_core::WeatherProvider`], and answers with the reshaped JSON. Upstream
//! failures are classified into a fixed set of client-visible error bodies.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use server::{AppState, app, router, serve};
