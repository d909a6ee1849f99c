//! The `CountryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `gazetteer-store-sqlite`). Higher layers (`gazetteer-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  country::{Country, NewCountry, RefreshMetadata},
  summary::SummarySnapshot,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Ordering by estimated GDP. Rows without an estimate always sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdpSort {
  Ascending,
  Descending,
}

impl GdpSort {
  /// Parse the `sort` query value. Anything other than `gdp_asc` or
  /// `gdp_desc` yields `None` (unsorted).
  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "gdp_asc" => Some(Self::Ascending),
      "gdp_desc" => Some(Self::Descending),
      _ => None,
    }
  }
}

/// Parameters for [`CountryStore::list_countries`]. Filters are exact,
/// case-sensitive equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryQuery {
  pub region:        Option<String>,
  pub currency_code: Option<String>,
  pub sort:          Option<GdpSort>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Gazetteer cache backend.
///
/// Country rows are only ever written by [`commit_refresh`], which is
/// all-or-nothing. The refresh metadata singleton is created once by
/// [`ensure_metadata`] and mutated in place afterwards.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
///
/// [`commit_refresh`]: CountryStore::commit_refresh
/// [`ensure_metadata`]: CountryStore::ensure_metadata
pub trait CountryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Metadata ──────────────────────────────────────────────────────────

  /// Create the metadata singleton if it is absent and return its current
  /// value. Called once at startup.
  fn ensure_metadata(
    &self,
  ) -> impl Future<Output = Result<RefreshMetadata, Self::Error>> + Send + '_;

  /// Read the metadata singleton. `None` if it was never created.
  fn metadata(
    &self,
  ) -> impl Future<Output = Result<Option<RefreshMetadata>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Upsert every country by name and stamp `refreshed_at` on the metadata
  /// singleton, all inside one transaction. Any failure leaves the store
  /// exactly as it was. Returns the number of countries written.
  ///
  /// Countries not in `countries` are left untouched.
  fn commit_refresh(
    &self,
    countries: Vec<NewCountry>,
    refreshed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete every country whose name contains `fragment`
  /// case-insensitively. Returns how many were removed.
  fn delete_countries<'a>(
    &'a self,
    fragment: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// List countries matching `query`, in storage order unless sorted.
  fn list_countries<'a>(
    &'a self,
    query: &'a CountryQuery,
  ) -> impl Future<Output = Result<Vec<Country>, Self::Error>> + Send + 'a;

  /// The first country (in storage order) whose name contains `fragment`
  /// case-insensitively.
  fn find_country<'a>(
    &'a self,
    fragment: &'a str,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + 'a;

  fn count_countries(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Read the total count, the `top` highest-GDP countries and the metadata
  /// in a single consistent view.
  fn summary(
    &self,
    top: usize,
  ) -> impl Future<Output = Result<SummarySnapshot, Self::Error>> + Send + '_;
}
