//! The record transformer: joins a raw country with the exchange-rate table
//! and derives its estimated GDP.
//!
//! `estimated_gdp = population × multiplier / exchange_rate`, where the
//! multiplier is drawn uniformly from `[1000, 2000]` for every country on
//! every refresh. Two refreshes over identical upstream data therefore
//! produce different GDP figures; that is expected.

use rand::Rng;
use rust_decimal::Decimal;

use crate::{
  Error, Result,
  country::{ExchangeRates, NewCountry, RawCountry},
};

pub const MULTIPLIER_MIN: u32 = 1000;
pub const MULTIPLIER_MAX: u32 = 2000;

/// Decimal places kept for stored exchange rates.
pub const RATE_SCALE: u32 = 6;
/// Decimal places kept for stored GDP estimates.
pub const GDP_SCALE: u32 = 2;

/// Draw one GDP multiplier from `rng`.
pub fn draw_multiplier<R: Rng + ?Sized>(rng: &mut R) -> u32 {
  rng.gen_range(MULTIPLIER_MIN..=MULTIPLIER_MAX)
}

/// Look up the rate for `currency_code`, if both are known. The value is
/// returned exactly as published; rounding to [`RATE_SCALE`] happens only on
/// the stored record.
pub fn resolve_rate(
  currency_code: Option<&str>,
  rates: &ExchangeRates,
) -> Option<Decimal> {
  currency_code.and_then(|code| rates.get(code)).copied()
}

/// `population × multiplier / exchange_rate`, or `None` when either input is
/// missing. A zero rate cannot be divided by and counts as missing.
///
/// Returns `Ok(None)` rather than an error for missing inputs; the only
/// failure is arithmetic overflow.
pub fn estimate_gdp(
  population: Option<u64>,
  exchange_rate: Option<Decimal>,
  multiplier: u32,
) -> Result<Option<Decimal>> {
  let (Some(population), Some(rate)) = (population, exchange_rate) else {
    return Ok(None);
  };
  if rate.is_zero() {
    return Ok(None);
  }
  Decimal::from(population)
    .checked_mul(Decimal::from(multiplier))
    .and_then(|scaled| scaled.checked_div(rate))
    .map(|gdp| Some(gdp.round_dp(GDP_SCALE)))
    .ok_or(Error::GdpOverflow { population, rate })
}

/// Transform one upstream entry using a multiplier drawn from `rng`.
pub fn transform<R: Rng + ?Sized>(
  raw: RawCountry,
  rates: &ExchangeRates,
  rng: &mut R,
) -> Result<NewCountry> {
  let multiplier = draw_multiplier(rng);
  transform_with_multiplier(raw, rates, multiplier)
}

/// Transform one upstream entry with a fixed multiplier.
///
/// A country without a population cannot be stored and is rejected.
pub fn transform_with_multiplier(
  raw: RawCountry,
  rates: &ExchangeRates,
  multiplier: u32,
) -> Result<NewCountry> {
  let currency_code = raw.primary_currency_code().map(str::to_owned);
  let exchange_rate = resolve_rate(currency_code.as_deref(), rates);

  let estimated_gdp = estimate_gdp(raw.population, exchange_rate, multiplier)?;
  let exchange_rate = exchange_rate.map(|rate| rate.round_dp(RATE_SCALE));

  let population = raw
    .population
    .ok_or_else(|| Error::MissingPopulation(raw.name.clone()))?;

  Ok(NewCountry {
    name: raw.name,
    capital: raw.capital,
    region: raw.region,
    population,
    currency_code,
    exchange_rate,
    estimated_gdp,
    flag_url: raw.flag,
  })
}

/// Transform a whole upstream batch, drawing a fresh multiplier per country.
pub fn transform_all<R: Rng + ?Sized>(
  raws: Vec<RawCountry>,
  rates: &ExchangeRates,
  rng: &mut R,
) -> Result<Vec<NewCountry>> {
  raws
    .into_iter()
    .map(|raw| transform(raw, rates, rng))
    .collect()
}
