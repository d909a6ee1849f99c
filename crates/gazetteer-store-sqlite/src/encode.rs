//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that text comparison orders them chronologically. Decimals are
//! stored as their exact string form.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use gazetteer_core::country::{Country, NewCountry};
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Columns selected by every country read, in [`CountryRow::from_row`] order.
pub const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, \
   currency_code, exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

/// Column values for one upsert, encoded ahead of entering the database
/// thread.
pub struct EncodedCountry {
  pub name:          String,
  pub capital:       Option<String>,
  pub region:        Option<String>,
  pub population:    i64,
  pub currency_code: Option<String>,
  pub exchange_rate: Option<String>,
  pub estimated_gdp: Option<String>,
  pub flag_url:      Option<String>,
}

impl EncodedCountry {
  pub fn encode(c: NewCountry) -> Result<Self> {
    let population = i64::try_from(c.population)
      .map_err(|_| Error::PopulationOutOfRange(c.name.clone()))?;
    Ok(Self {
      name: c.name,
      capital: c.capital,
      region: c.region,
      population,
      currency_code: c.currency_code,
      exchange_rate: c.exchange_rate.map(encode_decimal),
      estimated_gdp: c.estimated_gdp.map(encode_decimal),
      flag_url: c.flag_url,
    })
  }
}

/// Raw values read directly from a `countries` row.
pub struct CountryRow {
  pub id:                i64,
  pub name:              String,
  pub capital:           Option<String>,
  pub region:            Option<String>,
  pub population:        i64,
  pub currency_code:     Option<String>,
  pub exchange_rate:     Option<String>,
  pub estimated_gdp:     Option<String>,
  pub flag_url:          Option<String>,
  pub last_refreshed_at: String,
}

impl CountryRow {
  /// Read a row selected with [`COUNTRY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      name:              row.get(1)?,
      capital:           row.get(2)?,
      region:            row.get(3)?,
      population:        row.get(4)?,
      currency_code:     row.get(5)?,
      exchange_rate:     row.get(6)?,
      estimated_gdp:     row.get(7)?,
      flag_url:          row.get(8)?,
      last_refreshed_at: row.get(9)?,
    })
  }

  pub fn into_country(self) -> Result<Country> {
    let population = u64::try_from(self.population)
      .map_err(|_| Error::PopulationOutOfRange(self.name.clone()))?;
    let exchange_rate = self
      .exchange_rate
      .as_deref()
      .map(decode_decimal)
      .transpose()?;
    let estimated_gdp = self
      .estimated_gdp
      .as_deref()
      .map(decode_decimal)
      .transpose()?;

    Ok(Country {
      id: self.id,
      name: self.name,
      capital: self.capital,
      region: self.region,
      population,
      currency_code: self.currency_code,
      exchange_rate,
      estimated_gdp,
      flag_url: self.flag_url,
      last_refreshed_at: decode_dt(&self.last_refreshed_at)?,
    })
  }
}
