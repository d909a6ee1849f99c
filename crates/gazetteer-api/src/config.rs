//! Runtime server configuration.

use std::{path::PathBuf, time::Duration};

use gazetteer_upstream::{DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL, DEFAULT_TIMEOUT, UpstreamConfig};
use serde::Deserialize;

/// File name of the rendered summary inside [`ServerConfig::cache_dir`].
pub const SUMMARY_IMAGE: &str = "summary.png";

/// Deserialised from `config.toml` overlaid with `GAZETTEER_*` variables.
/// Every field has a default, so an empty configuration is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub cache_dir:             PathBuf,
  pub countries_url:         String,
  pub rates_url:             String,
  pub upstream_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "0.0.0.0".to_string(),
      port:                  3000,
      store_path:            PathBuf::from("gazetteer.sqlite3"),
      cache_dir:             PathBuf::from("cache"),
      countries_url:         DEFAULT_COUNTRIES_URL.to_string(),
      rates_url:             DEFAULT_RATES_URL.to_string(),
      upstream_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
    }
  }
}

impl ServerConfig {
  pub fn image_path(&self) -> PathBuf { self.cache_dir.join(SUMMARY_IMAGE) }

  pub fn upstream(&self) -> UpstreamConfig {
    UpstreamConfig {
      countries_url: self.countries_url.clone(),
      rates_url:     self.rates_url.clone(),
      timeout:       Duration::from_secs(self.upstream_timeout_secs),
    }
  }
}
