//! Text content of the summary image, independent of drawing.

use std::fmt;

use chrono::{DateTime, Utc};
use gazetteer_core::summary::SummarySnapshot;
use num_format::{Locale, ToFormattedString};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

pub const TITLE: &str = "Countries API Summary";
pub const TOP_HEADING: &str = "Top 5 Countries by Estimated GDP (USD):";
pub const NOT_AVAILABLE: &str = "N/A";

/// `$1,234,568`: whole dollars with thousands separators, or `N/A`.
pub fn format_gdp(gdp: Option<Decimal>) -> String {
  gdp
    .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    .and_then(|d| d.to_i128())
    .map(|whole| format!("${}", whole.to_formatted_string(&Locale::en)))
    .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// `Fri, 17 Oct 2025 09:30:00 GMT`, or `N/A`.
pub fn format_refreshed_at(at: Option<DateTime<Utc>>) -> String {
  at.map(|t| t.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// One ranked row, `rank. name — value`. The value is drawn in its own
/// colour right after [`LeaderLine::prefix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderLine {
  pub label: String,
  pub value: String,
}

impl LeaderLine {
  /// `rank. name — `, everything before the value.
  pub fn prefix(&self) -> String { format!("{} — ", self.label) }
}

impl fmt::Display for LeaderLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.prefix(), self.value)
  }
}

/// Every string the image shows, in drawing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLines {
  pub title:     String,
  pub total:     String,
  pub heading:   String,
  pub leaders:   Vec<LeaderLine>,
  pub refreshed: String,
}

impl SummaryLines {
  pub fn from_snapshot(snapshot: &SummarySnapshot) -> Self {
    let leaders = snapshot
      .top
      .iter()
      .enumerate()
      .map(|(i, entry)| LeaderLine {
        label: format!("{}. {}", i + 1, entry.name),
        value: format_gdp(entry.estimated_gdp),
      })
      .collect();

    Self {
      title: TITLE.to_owned(),
      total: format!("Total Countries in DB: {}", snapshot.total_countries),
      heading: TOP_HEADING.to_owned(),
      leaders,
      refreshed: format!(
        "Last Refreshed: {}",
        format_refreshed_at(snapshot.last_refreshed_at)
      ),
    }
  }
}
