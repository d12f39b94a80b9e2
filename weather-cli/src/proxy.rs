use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use weather_core::{Coordinates, CurrentConditions, Forecast};

/// Shown when the proxy gave no usable error message.
pub const FETCH_FAILED: &str = "Failed to fetch weather";

/// Failure talking to the proxy. `Display` is what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Failed to fetch weather")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to fetch weather")]
    Decode(#[source] reqwest::Error),
}

/// The three lookups the client makes against the proxy.
#[async_trait]
pub trait ProxyApi: Send + Sync {
    async fn current_by_city(&self, city: &str) -> Result<CurrentConditions, ClientError>;

    async fn forecast_by_city(&self, city: &str) -> Result<Forecast, ClientError>;

    async fn current_by_coordinates(
        &self,
        at: Coordinates,
    ) -> Result<CurrentConditions, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    base: Url,
    http: Client,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base =
            Url::parse(base_url).with_context(|| format!("Invalid proxy URL '{base_url}'"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("Proxy URL '{base_url}' cannot have path segments appended"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build proxy HTTP client")?;

        Ok(Self { base, http })
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Never fails: `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        tracing::debug!(%url, "proxy request");

        let res = self.http.get(url).send().await.map_err(ClientError::Transport)?;
        let status = res.status();

        if !status.is_success() {
            let message = res
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FETCH_FAILED.to_string());
            return Err(ClientError::Api { status, message });
        }

        res.json::<T>().await.map_err(ClientError::Decode)
    }
}

#[async_trait]
impl ProxyApi for ProxyClient {
    async fn current_by_city(&self, city: &str) -> Result<CurrentConditions, ClientError> {
        self.get_json(self.endpoint(&["weather", city])).await
    }

    async fn forecast_by_city(&self, city: &str) -> Result<Forecast, ClientError> {
        self.get_json(self.endpoint(&["forecast", city])).await
    }

    async fn current_by_coordinates(
        &self,
        at: Coordinates,
    ) -> Result<CurrentConditions, ClientError> {
        let lat = at.latitude.to_string();
        let lon = at.longitude.to_string();
        self.get_json(self.endpoint(&["weather", "coords", &lat, &lon])).await
    }
}
