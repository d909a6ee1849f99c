//! [`UpstreamClient`]: concurrent fetch of countries and exchange rates.

use std::time::Duration;

use gazetteer_core::country::{ExchangeRates, RawCountry};
use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result, UpstreamSource};

pub const DEFAULT_COUNTRIES_URL: &str =
  "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints and per-request timeout for the two providers.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
  pub countries_url: String,
  pub rates_url:     String,
  pub timeout:       Duration,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      countries_url: DEFAULT_COUNTRIES_URL.to_owned(),
      rates_url:     DEFAULT_RATES_URL.to_owned(),
      timeout:       DEFAULT_TIMEOUT,
    }
  }
}

/// Both datasets, fetched together.
#[derive(Debug, Clone, Default)]
pub struct UpstreamData {
  pub countries: Vec<RawCountry>,
  pub rates:     ExchangeRates,
}

/// Body of the exchange-rate provider's `latest` endpoint. Only `rates` is
/// used; `result` distinguishes a successful payload from an error one.
#[derive(Debug, Deserialize)]
struct RatesBody {
  #[serde(default)]
  result:     Option<String>,
  #[serde(default, rename = "error-type")]
  error_type: Option<String>,
  #[serde(default)]
  rates:      Option<ExchangeRates>,
}

/// Async HTTP client for the upstream providers.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
  http:   Client,
  config: UpstreamConfig,
}

impl UpstreamClient {
  pub fn new(config: UpstreamConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("gazetteer/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(Error::Client)?;
    Ok(Self { http, config })
  }

  /// Fetch both datasets concurrently. The first failure aborts the other
  /// request and is returned; no partial data escapes.
  pub async fn fetch(&self) -> Result<UpstreamData> {
    tracing::info!("fetching countries and exchange rates");
    let (countries, rates) =
      tokio::try_join!(self.fetch_countries(), self.fetch_rates())?;
    tracing::info!(
      countries = countries.len(),
      rates = rates.len(),
      "upstream fetch complete"
    );
    Ok(UpstreamData { countries, rates })
  }

  /// `GET <countries_url>`
  pub async fn fetch_countries(&self) -> Result<Vec<RawCountry>> {
    let unavailable = |reason| Error::Unavailable {
      upstream: UpstreamSource::Countries,
      reason,
    };

    self
      .http
      .get(&self.config.countries_url)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(unavailable)?
      .json()
      .await
      .map_err(unavailable)
  }

  /// `GET <rates_url>`
  pub async fn fetch_rates(&self) -> Result<ExchangeRates> {
    let unavailable = |reason| Error::Unavailable {
      upstream: UpstreamSource::ExchangeRates,
      reason,
    };

    let body: RatesBody = self
      .http
      .get(&self.config.rates_url)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(unavailable)?
      .json()
      .await
      .map_err(unavailable)?;

    if body.result.as_deref() == Some("error") {
      return Err(Error::Rejected {
        upstream: UpstreamSource::ExchangeRates,
        reason:   body.error_type.unwrap_or_else(|| "unspecified error".into()),
      });
    }

    body.rates.ok_or_else(|| Error::Rejected {
      upstream: UpstreamSource::ExchangeRates,
      reason:   "response carries no rates".into(),
    })
  }
}
