//! Error type for `gazetteer-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("population of {0:?} does not fit the population column")]
  PopulationOutOfRange(String),

  /// The refresh metadata row is gone; the refresh was rolled back.
  #[error("refresh metadata row is missing")]
  MetadataMissing,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
