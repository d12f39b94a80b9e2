//! Plain-text rendering of [`ViewState`].

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use std::fmt;
use weather_core::{CurrentConditions, ForecastEntry};

use crate::{session::ViewState, theme::DayPeriod};

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Header line: local time, date and the day-period theme.
///
/// With `color` set the line is tinted by the period, subject to the usual
/// `NO_COLOR`/`CLICOLOR` handling of the terminal.
pub fn header(state: &ViewState, color: bool) -> String {
    let period = DayPeriod::of(&state.clock);
    let line = format!(
        "Weather App  {} - {}  ({})",
        state.clock.format("%H:%M:%S"),
        state.clock.format("%Y-%m-%d"),
        period
    );

    if color { line.color(period.color()).to_string() } else { line }
}

/// One screenful of output.
pub struct Frame<'a> {
    state: &'a ViewState,
    color: bool,
}

impl<'a> Frame<'a> {
    pub fn new(state: &'a ViewState, color: bool) -> Self {
        Self { state, color }
    }
}

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;
        writeln!(f, "{}", header(state, self.color))?;

        if let Some(error) = &state.error {
            writeln!(f, "\n  Error: {error}")?;
        }

        if state.is_loading {
            return writeln!(f, "\n  Loading weather data...");
        }

        if let Some(current) = &state.current {
            write_current(f, current)?;
        }

        if !state.forecast.is_empty() {
            write_forecast(f, &state.forecast)?;
        }

        Ok(())
    }
}

pub fn render(state: &ViewState, color: bool) -> String {
    Frame::new(state, color).to_string()
}

fn write_current(f: &mut fmt::Formatter<'_>, c: &CurrentConditions) -> fmt::Result {
    let visibility = c.visibility.map_or_else(|| "n/a".to_string(), |km| format!("{km:.1} km"));

    writeln!(f, "\n  {}, {}", c.city, c.country)?;
    writeln!(f, "  {}°C  {}", c.temperature, c.description)?;
    writeln!(f, "  Feels like {}°C", c.feels_like)?;
    writeln!(
        f,
        "  Humidity {}%   Wind {:.1} m/s   Pressure {} hPa   Visibility {}",
        c.humidity, c.wind_speed, c.pressure, visibility
    )?;
    writeln!(f, "  Sunrise {}   Sunset {}", local_time(c.sunrise), local_time(c.sunset))?;
    writeln!(f, "  Icon {}", icon_url(&c.icon))
}

fn write_forecast(f: &mut fmt::Formatter<'_>, entries: &[ForecastEntry]) -> fmt::Result {
    writeln!(f, "\n  Forecast")?;
    for entry in entries {
        let local = entry.date.with_timezone(&Local);
        writeln!(
            f,
            "  {}  {:>4}°C  {:<20} {}%",
            local.format("%a %H:%M"),
            entry.temperature,
            entry.description,
            entry.humidity
        )?;
    }
    Ok(())
}
