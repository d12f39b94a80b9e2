//! Where "here" is. The terminal has no geolocation service, so the only
//! source is coordinates the user passes explicitly.

use async_trait::async_trait;
use weather_core::Coordinates;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location service unavailable")]
    Unavailable,
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// A location known up front, or none at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(Option<Coordinates>);

impl FixedLocation {
    pub fn new(at: Coordinates) -> Self {
        Self(Some(at))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }

    /// Both halves must be present and finite, otherwise the location is unavailable.
    pub fn from_args(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                Coordinates::new(lat, lon).map_or_else(Self::unavailable, Self::new)
            }
            _ => Self::unavailable(),
        }
    }
}

#[async_trait]
impl Geolocator for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        self.0.ok_or(LocationError::Unavailable)
    }
}
