//! The read model behind the summary image.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How many leaders the summary image lists.
pub const SUMMARY_TOP_N: usize = 5;

/// One ranked line of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
  pub name:          String,
  pub estimated_gdp: Option<Decimal>,
}

/// A consistent snapshot of the cache, read after a refresh commits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarySnapshot {
  pub total_countries:   usize,
  /// Highest estimated GDP first, nulls last; at most [`SUMMARY_TOP_N`].
  pub top:               Vec<SummaryEntry>,
  pub last_refreshed_at: Option<DateTime<Utc>>,
}
