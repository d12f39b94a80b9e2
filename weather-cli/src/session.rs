//! View state of the client and the operations that are allowed to change it.
//!
//! Every fetch cycle is tagged with a [`RequestTicket`]. Only the most recent
//! ticket may write results, so a slow response to an older search can never
//! overwrite a newer one.

use chrono::{DateTime, Local};
use weather_core::{Coordinates, CurrentConditions, Forecast, ForecastEntry};

use crate::{
    location::Geolocator,
    proxy::{ClientError, FETCH_FAILED, ProxyApi},
};

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub current: Option<CurrentConditions>,
    /// At most [`ForecastWindow::LIMIT`] entries.
    pub forecast: Vec<ForecastEntry>,
    pub query: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub clock: DateTime<Local>,
}

impl ViewState {
    pub fn new(clock: DateTime<Local>) -> Self {
        Self {
            current: None,
            forecast: Vec::new(),
            query: String::new(),
            is_loading: false,
            error: None,
            clock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// How the forecast list is cut down for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForecastWindow {
    /// First slots as received (3-hourly, so usually well under a day).
    #[default]
    Slots,
    /// First slot of each UTC calendar day.
    Daily,
}

impl ForecastWindow {
    pub const LIMIT: usize = 5;

    pub fn from_daily_flag(daily: bool) -> Self {
        if daily { ForecastWindow::Daily } else { ForecastWindow::Slots }
    }

    pub fn apply(self, entries: Vec<ForecastEntry>) -> Vec<ForecastEntry> {
        match self {
            ForecastWindow::Slots => entries.into_iter().take(Self::LIMIT).collect(),
            ForecastWindow::Daily => {
                let mut days: Vec<ForecastEntry> = Vec::with_capacity(Self::LIMIT);
                for entry in entries {
                    if days.len() == Self::LIMIT {
                        break;
                    }
                    let day = entry.date.date_naive();
                    if !days.iter().any(|d| d.date.date_naive() == day) {
                        days.push(entry);
                    }
                }
                days
            }
        }
    }
}

pub struct Session<A> {
    api: A,
    state: ViewState,
    latest: u64,
    window: ForecastWindow,
    default_city: String,
}

impl<A: ProxyApi> Session<A> {
    pub fn new(api: A, default_city: impl Into<String>, window: ForecastWindow) -> Self {
        Self {
            api,
            state: ViewState::new(Local::now()),
            latest: 0,
            window,
            default_city: default_city.into(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    pub fn tick(&mut self, now: DateTime<Local>) {
        self.state.clock = now;
    }

    /// Show weather for the user's location, or the default city when there is none.
    pub async fn initialize(&mut self, locator: &dyn Geolocator) {
        match locator.locate().await {
            Ok(at) => self.search_by_coordinates(at).await,
            Err(e) => {
                tracing::info!("{e}; falling back to {}", self.default_city);
                let city = self.default_city.clone();
                self.search(&city).await;
            }
        }
    }

    /// Fetch current conditions and forecast for `city` concurrently.
    ///
    /// Blank input is ignored: no request, no state change.
    pub async fn search(&mut self, city: &str) {
        let Some(ticket) = self.begin_search(city) else {
            return;
        };
        let city = self.state.query.clone();

        let (current, forecast) =
            tokio::join!(self.api.current_by_city(&city), self.api.forecast_by_city(&city));

        let outcome = match (current, forecast) {
            (Ok(current), Ok(forecast)) => Ok((current, forecast)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        self.finish_search(ticket, outcome);
    }

    /// Fetch current conditions for a location; on failure fall back to the default city.
    pub async fn search_by_coordinates(&mut self, at: Coordinates) {
        let ticket = self.begin_fetch();
        let outcome = self.api.current_by_coordinates(at).await;

        if self.finish_coordinates(ticket, outcome) {
            let city = self.default_city.clone();
            self.search(&city).await;
        }
    }

    /// Start a search cycle. Returns `None` for blank input.
    pub fn begin_search(&mut self, city: &str) -> Option<RequestTicket> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        self.state.query = city.to_string();
        Some(self.begin_fetch())
    }

    /// Apply search results. Returns `false` when the ticket is stale and nothing changed.
    pub fn finish_search(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<(CurrentConditions, Forecast), ClientError>,
    ) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }

        match outcome {
            Ok((current, forecast)) => {
                self.state.current = Some(current);
                self.state.forecast = self.window.apply(forecast.forecast);
            }
            Err(e) => {
                tracing::warn!(error = ?e, query = %self.state.query, "search failed");
                self.state.error = Some(e.to_string());
                self.state.current = None;
                self.state.forecast.clear();
            }
        }

        self.state.is_loading = false;
        true
    }

    /// Start a fetch cycle; every older ticket becomes stale.
    pub fn begin_fetch(&mut self) -> RequestTicket {
        self.latest += 1;
        self.state.is_loading = true;
        self.state.error = None;
        RequestTicket(self.latest)
    }

    /// Apply a coordinates lookup. Returns `true` when the caller should fall
    /// back to the default city.
    pub fn finish_coordinates(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<CurrentConditions, ClientError>,
    ) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }

        self.state.is_loading = false;
        match outcome {
            Ok(current) => {
                self.state.query = current.city.clone();
                self.state.current = Some(current);
                false
            }
            Err(e) => {
                tracing::warn!(error = ?e, "weather by coordinates failed");
                self.state.error = Some(FETCH_FAILED.to_string());
                true
            }
        }
    }

    fn is_latest(&self, ticket: RequestTicket) -> bool {
        if ticket.0 != self.latest {
            tracing::debug!(stale = ticket.0, latest = self.latest, "discarding stale response");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::FixedLocation;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Current(String),
        Forecast(String),
        Coordinates(f64, f64),
    }

    /// Answers from a list of known cities and records every call.
    #[derive(Default)]
    struct FakeProxy {
        known: Vec<&'static str>,
        coordinates_fail: bool,
        forecast_fail: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeProxy {
        fn knowing(known: &[&'static str]) -> Self {
            Self { known: known.to_vec(), ..Default::default() }
        }

        fn knows(&self, city: &str) -> bool {
            self.known.iter().any(|k| *k == city)
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn not_found() -> ClientError {
            ClientError::Api { status: StatusCode::NOT_FOUND, message: "City not found".into() }
        }
    }

    #[async_trait]
    impl ProxyApi for &FakeProxy {
        async fn current_by_city(&self, city: &str) -> Result<CurrentConditions, ClientError> {
            self.record(Call::Current(city.to_string()));
            if self.knows(city) { Ok(current(city)) } else { Err(FakeProxy::not_found()) }
        }

        async fn forecast_by_city(&self, city: &str) -> Result<Forecast, ClientError> {
            self.record(Call::Forecast(city.to_string()));
            if self.forecast_fail {
                return Err(ClientError::Api {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Failed to fetch forecast data".into(),
                });
            }
            if self.knows(city) { Ok(forecast(city, 40)) } else { Err(FakeProxy::not_found()) }
        }

        async fn current_by_coordinates(
            &self,
            at: Coordinates,
        ) -> Result<CurrentConditions, ClientError> {
            self.record(Call::Coordinates(at.latitude, at.longitude));
            if self.coordinates_fail {
                Err(ClientError::Api {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Failed to fetch weather data".into(),
                })
            } else {
                Ok(current("Greenwich"))
            }
        }
    }

    fn current(city: &str) -> CurrentConditions {
        let sunrise = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        CurrentConditions {
            city: city.to_string(),
            country: "GB".to_string(),
            temperature: 9,
            description: "mist".to_string(),
            icon: "50n".to_string(),
            humidity: 93,
            pressure: 1009,
            wind_speed: 1.5,
            feels_like: 8,
            visibility: Some(2.5),
            sunrise,
            sunset: sunrise,
        }
    }

    fn forecast(city: &str, slots: usize) -> Forecast {
        // 2023-11-14T21:00:00Z, so the first day has a single slot.
        let start = Utc.timestamp_opt(1_699_995_600, 0).unwrap();
        Forecast {
            city: city.to_string(),
            country: "GB".to_string(),
            forecast: (0..slots)
                .map(|i| ForecastEntry {
                    date: start + chrono::Duration::hours(3 * i as i64),
                    temperature: i as i64,
                    description: "rain".to_string(),
                    icon: "10n".to_string(),
                    humidity: 80,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn blank_search_is_a_no_op() {
        let proxy = FakeProxy::knowing(&["London"]);
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);
        let before = session.state().clone();

        session.search("").await;
        session.search("   ").await;

        assert!(proxy.calls().is_empty());
        assert_eq!(session.state(), &before);
    }

    #[tokio::test]
    async fn search_populates_both_slots_and_truncates_forecast() {
        let proxy = FakeProxy::knowing(&["Paris"]);
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.search("  Paris ").await;

        let state = session.state();
        assert_eq!(state.query, "Paris");
        assert_eq!(state.current.as_ref().map(|c| c.city.as_str()), Some("Paris"));
        assert_eq!(state.forecast.len(), 5);
        assert_eq!(state.forecast[0].temperature, 0);
        assert_eq!(state.forecast[4].temperature, 4);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
        assert_eq!(
            proxy.calls(),
            vec![Call::Current("Paris".into()), Call::Forecast("Paris".into())]
        );
    }

    #[tokio::test]
    async fn failed_search_surfaces_message_and_clears_results() {
        let proxy = FakeProxy::knowing(&["Paris"]);
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.search("Paris").await;
        session.search("Atlantis").await;

        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("City not found"));
        assert!(state.current.is_none());
        assert!(state.forecast.is_empty());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn forecast_failure_fails_the_whole_search() {
        let proxy = FakeProxy { forecast_fail: true, ..FakeProxy::knowing(&["Paris"]) };
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.search("Paris").await;

        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("Failed to fetch forecast data"));
        assert!(state.current.is_none());
    }

    #[tokio::test]
    async fn a_new_search_clears_the_previous_error() {
        let proxy = FakeProxy::knowing(&["Paris"]);
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.search("Atlantis").await;
        assert!(session.state().error.is_some());

        session.search("Paris").await;
        assert_eq!(session.state().error, None);
        assert!(session.state().current.is_some());
    }

    #[test]
    fn stale_results_are_discarded() {
        let proxy = FakeProxy::default();
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        let first = session.begin_search("Paris").unwrap();
        let second = session.begin_search("Rome").unwrap();

        assert!(session.finish_search(second, Ok((current("Rome"), forecast("Rome", 3)))));
        assert!(!session.finish_search(first, Ok((current("Paris"), forecast("Paris", 3)))));

        let state = session.state();
        assert_eq!(state.current.as_ref().map(|c| c.city.as_str()), Some("Rome"));
        assert_eq!(state.query, "Rome");
        assert!(!state.is_loading);
    }

    #[test]
    fn stale_failure_does_not_clear_newer_results() {
        let proxy = FakeProxy::default();
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        let first = session.begin_search("Atlantis").unwrap();
        let second = session.begin_search("Rome").unwrap();

        assert!(!session.finish_search(first, Err(FakeProxy::not_found())));
        assert!(session.state().is_loading);
        assert!(session.finish_search(second, Ok((current("Rome"), forecast("Rome", 3)))));
        assert_eq!(session.state().error, None);
    }

    #[tokio::test]
    async fn coordinates_adopt_resolved_city_name() {
        let proxy = FakeProxy::default();
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.search_by_coordinates(Coordinates::new(51.48, 0.0).unwrap()).await;

        let state = session.state();
        assert_eq!(state.query, "Greenwich");
        assert_eq!(state.current.as_ref().map(|c| c.city.as_str()), Some("Greenwich"));
        assert!(state.forecast.is_empty());
        assert_eq!(proxy.calls(), vec![Call::Coordinates(51.48, 0.0)]);
    }

    #[tokio::test]
    async fn coordinates_failure_falls_back_to_default_city() {
        let proxy = FakeProxy { coordinates_fail: true, ..FakeProxy::knowing(&["London"]) };
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.search_by_coordinates(Coordinates::new(0.0, 0.0).unwrap()).await;

        let state = session.state();
        assert_eq!(state.error, None);
        assert_eq!(state.query, "London");
        assert_eq!(state.current.as_ref().map(|c| c.city.as_str()), Some("London"));
        assert_eq!(state.forecast.len(), 5);
        assert_eq!(proxy.calls().len(), 3);
    }

    #[tokio::test]
    async fn initialize_prefers_location() {
        let proxy = FakeProxy::knowing(&["London"]);
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);

        session.initialize(&FixedLocation::new(Coordinates::new(51.48, 0.0).unwrap())).await;

        assert_eq!(session.state().query, "Greenwich");
    }

    #[tokio::test]
    async fn initialize_without_location_uses_default_city() {
        let proxy = FakeProxy::knowing(&["Oslo"]);
        let mut session = Session::new(&proxy, "Oslo", ForecastWindow::Slots);

        session.initialize(&FixedLocation::unavailable()).await;

        assert_eq!(session.state().query, "Oslo");
        assert_eq!(proxy.calls(), vec![Call::Current("Oslo".into()), Call::Forecast("Oslo".into())]);
    }

    #[test]
    fn daily_window_keeps_one_slot_per_day() {
        let entries = forecast("London", 40).forecast;
        let daily = ForecastWindow::Daily.apply(entries);

        assert_eq!(daily.len(), 5);
        let days: Vec<_> = daily.iter().map(|e| e.date.date_naive()).collect();
        assert!(days.windows(2).all(|w| w[0] < w[1]));
        // 21:00 on day one, then midnight slots.
        assert_eq!(daily[0].temperature, 0);
        assert_eq!(daily[1].temperature, 1);
        assert_eq!(daily[2].temperature, 9);
    }

    #[test]
    fn slot_window_handles_short_lists() {
        let entries = forecast("London", 3).forecast;
        assert_eq!(ForecastWindow::Slots.apply(entries).len(), 3);
    }

    #[test]
    fn tick_only_moves_the_clock() {
        let proxy = FakeProxy::default();
        let mut session = Session::new(&proxy, "London", ForecastWindow::Slots);
        let later = session.state().clock + chrono::Duration::seconds(1);

        session.tick(later);

        assert_eq!(session.state().clock, later);
        assert!(session.state().current.is_none());
    }
}
