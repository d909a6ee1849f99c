//! Country records, the unit of the Gazetteer cache.
//!
//! Upstream entries arrive as [`RawCountry`] values, are normalised into
//! [`NewCountry`] by the transformer, and come back out of the store as
//! [`Country`] once a write timestamp has been assigned.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange rates keyed by ISO 4217 currency code, in units of local currency
/// per 1 USD.
pub type ExchangeRates = HashMap<String, Decimal>;

// ─── Upstream shapes ─────────────────────────────────────────────────────────

/// One entry of a country's `currencies` array as the directory API reports
/// it. Some territories list currencies without a code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCurrency {
  #[serde(default)]
  pub code:   Option<String>,
  #[serde(default)]
  pub name:   Option<String>,
  #[serde(default)]
  pub symbol: Option<String>,
}

/// A country entry exactly as fetched from the directory API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCountry {
  pub name:       String,
  #[serde(default)]
  pub capital:    Option<String>,
  #[serde(default)]
  pub region:     Option<String>,
  #[serde(default)]
  pub population: Option<u64>,
  #[serde(default)]
  pub flag:       Option<String>,
  /// Absent for a handful of entries (e.g. Antarctica).
  #[serde(default)]
  pub currencies: Option<Vec<RawCurrency>>,
}

impl RawCountry {
  /// The code of the first listed currency, if any.
  pub fn primary_currency_code(&self) -> Option<&str> {
    self
      .currencies
      .as_ref()
      .and_then(|list| list.first())
      .and_then(|c| c.code.as_deref())
  }
}

// ─── Normalised records ──────────────────────────────────────────────────────

/// A transformed country, ready to be upserted. The store assigns the write
/// timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCountry {
  pub name:          String,
  pub capital:       Option<String>,
  pub region:        Option<String>,
  pub population:    u64,
  pub currency_code: Option<String>,
  #[serde(with = "rust_decimal::serde::float_option")]
  pub exchange_rate: Option<Decimal>,
  #[serde(with = "rust_decimal::serde::float_option")]
  pub estimated_gdp: Option<Decimal>,
  pub flag_url:      Option<String>,
}

/// A persisted country row.
///
/// `name` is the natural key: stored with its original casing, matched
/// case-insensitively by [`name_matches`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
  pub id:                i64,
  pub name:              String,
  pub capital:           Option<String>,
  pub region:            Option<String>,
  pub population:        u64,
  pub currency_code:     Option<String>,
  #[serde(with = "rust_decimal::serde::float_option")]
  pub exchange_rate:     Option<Decimal>,
  #[serde(with = "rust_decimal::serde::float_option")]
  pub estimated_gdp:     Option<Decimal>,
  pub flag_url:          Option<String>,
  /// Set on every write.
  pub last_refreshed_at: DateTime<Utc>,
}

// ─── Metadata singleton ──────────────────────────────────────────────────────

/// The process-wide refresh record. Exactly one exists once the store has
/// been initialised; `last_refreshed_at` stays `None` until the first
/// successful refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshMetadata {
  pub last_refreshed_at: Option<DateTime<Utc>>,
}

// ─── Name matching ───────────────────────────────────────────────────────────

/// Case-insensitive substring match of `fragment` against a stored name.
pub fn name_matches(name: &str, fragment: &str) -> bool {
  name.to_lowercase().contains(&fragment.to_lowercase())
}
