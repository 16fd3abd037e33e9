use crate::rates::snapshot::RateSnapshot;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Public endpoint quoting every currency against USD.
pub const DEFAULT_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Connect and read timeout for a single fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from fetching a rate set.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    #[error("connection error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error: HTTP {0}")]
    Status(u16),
    #[error("malformed rate data: {0}")]
    Decode(String),
    #[error("rate source unavailable: {0}")]
    Unavailable(String),
    #[error("rate fetch worker exited without a result")]
    Disconnected,
}

/// A source of exchange rates quoted against the reference unit.
pub trait RateProvider: Send + Sync {
    fn fetch(&self) -> Result<RateSnapshot, FetchError>;
}

impl<P: RateProvider + ?Sized> RateProvider for Box<P> {
    fn fetch(&self) -> Result<RateSnapshot, FetchError> {
        (**self).fetch()
    }
}

/// Fetches rates from an exchangerate-api compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    url: String,
    client: Client,
}

impl HttpRateProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RateProvider for HttpRateProvider {
    fn fetch(&self) -> Result<RateSnapshot, FetchError> {
        log::debug!("fetching rates from {}", self.url);
        let response = self.client.get(&self.url).send()?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text()?;
        RateSnapshot::from_json(&body)
    }
}

/// Serves a fixed snapshot, or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    snapshot: Option<RateSnapshot>,
    reason: String,
}

impl StaticRateProvider {
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            reason: String::new(),
        }
    }

    /// A provider whose every fetch fails with `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            snapshot: None,
            reason: reason.into(),
        }
    }
}

impl RateProvider for StaticRateProvider {
    fn fetch(&self) -> Result<RateSnapshot, FetchError> {
        self.snapshot
            .clone()
            .ok_or_else(|| FetchError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;

    #[test]
    fn test_http_provider_creation() {
        let provider = HttpRateProvider::new(DEFAULT_API_URL, DEFAULT_TIMEOUT);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let provider =
            HttpRateProvider::new("http://127.0.0.1:9/latest/USD", Duration::from_millis(500)).unwrap();
        assert!(matches!(provider.fetch(), Err(FetchError::Transport(_))));
    }

    #[test]
    fn test_static_provider() {
        let snapshot = RateSnapshot::new([(CurrencyCode::new("EUR"), 0.9)]);
        let provider = StaticRateProvider::new(snapshot.clone());
        assert_eq!(provider.fetch().unwrap(), snapshot);
    }

    #[test]
    fn test_static_unavailable() {
        let provider = StaticRateProvider::unavailable("offline");
        let err = provider.fetch().unwrap_err();
        assert_eq!(err.to_string(), "rate source unavailable: offline");
    }
}
