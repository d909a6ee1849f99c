//! Error types for `gazetteer-core`.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("country {0:?} has no population")]
  MissingPopulation(String),

  #[error("estimated GDP overflows for population {population} at rate {rate}")]
  GdpOverflow { population: u64, rate: Decimal },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
