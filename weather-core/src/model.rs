use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Reshaped current conditions for one place.
///
/// All unit conversions are already applied: temperatures are whole degrees
/// Celsius, visibility is kilometres, sunrise/sunset are UTC timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub city: String,
    pub country: String,
    pub temperature: i64,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub feels_like: i64,
    /// `None` when the provider did not report visibility.
    pub visibility: Option<f64>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// One forecast time slot (the provider uses 3-hour slots).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub date: DateTime<Utc>,
    pub temperature: i64,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: String,
    pub country: String,
    pub forecast: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Both components must be finite numbers.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        (latitude.is_finite() && longitude.is_finite()).then_some(Self { latitude, longitude })
    }

    /// Parse the textual form used in URL path segments.
    pub fn parse(latitude: &str, longitude: &str) -> Option<Self> {
        let lat = latitude.trim().parse::<f64>().ok()?;
        let lon = longitude.trim().parse::<f64>().ok()?;
        Self::new(lat, lon)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Liveness report; `timestamp` is ISO 8601 UTC with millisecond precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

impl HealthStatus {
    pub fn ok_at(now: DateTime<Utc>) -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn current_conditions_use_camel_case_on_the_wire() {
        let sunrise = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let current = CurrentConditions {
            city: "London".into(),
            country: "GB".into(),
            temperature: 12,
            description: "light rain".into(),
            icon: "10d".into(),
            humidity: 81,
            pressure: 1012,
            wind_speed: 4.1,
            feels_like: 11,
            visibility: Some(10.0),
            sunrise,
            sunset: sunrise,
        };

        let json = serde_json::to_value(&current).unwrap();
        assert_eq!(json["windSpeed"], 4.1);
        assert_eq!(json["feelsLike"], 11);
        assert_eq!(json["sunrise"], "2023-11-14T22:13:20Z");
        assert!(json.get("wind_speed").is_none());
    }

    #[test]
    fn coordinates_reject_non_finite_and_garbage() {
        assert!(Coordinates::parse("51.5", "-0.12").is_some());
        assert!(Coordinates::parse("NaN", "0").is_none());
        assert!(Coordinates::parse("inf", "0").is_none());
        assert!(Coordinates::parse("north", "0").is_none());
    }

    #[test]
    fn health_timestamp_has_millisecond_precision() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let health = HealthStatus::ok_at(now);
        assert_eq!(health.status, "OK");
        assert_eq!(health.timestamp, "2024-05-01T12:00:00.000Z");
    }
}
