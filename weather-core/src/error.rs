/// Classification of a failed upstream lookup.
///
/// Only two outcomes matter to callers: the provider said the place does not
/// exist, or something else went wrong. The wrapped cause is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("City not found")]
    NotFound,

    #[error("upstream weather provider failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl WeatherError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::NotFound)
    }
}
