//! The refresh pipeline: fetch both providers, transform, commit.
//!
//! Nothing is written unless both fetches and every transform succeed, and
//! the commit itself is a single store transaction. Rendering is not part of
//! the pipeline; callers enqueue it on the [`RenderQueue`] after a successful
//! commit.
//!
//! [`RenderQueue`]: crate::worker::RenderQueue

use chrono::{DateTime, Utc};
use gazetteer_core::{store::CountryStore, transform::transform_all};
use gazetteer_upstream::UpstreamClient;
use rand::Rng;
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum RefreshError {
  #[error(transparent)]
  Upstream(#[from] gazetteer_upstream::Error),

  #[error("transform failed: {0}")]
  Transform(#[from] gazetteer_core::Error),

  #[error("commit failed: {0}")]
  Commit(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<RefreshError> for ApiError {
  fn from(e: RefreshError) -> Self {
    let source = match &e {
      RefreshError::Upstream(u) => u.upstream(),
      _ => None,
    };
    match source {
      Some(source) => ApiError::UpstreamUnavailable(source),
      None => ApiError::internal(e),
    }
  }
}

/// What a successful refresh wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
  pub countries_processed: usize,
  pub refreshed_at:        DateTime<Utc>,
}

/// Run one refresh against `store`, drawing GDP multipliers from `rng`.
pub async fn run_refresh<S, R>(
  store: &S,
  upstream: &UpstreamClient,
  rng: &mut R,
) -> Result<RefreshReport, RefreshError>
where
  S: CountryStore,
  R: Rng + Send,
{
  let data = upstream.fetch().await.inspect_err(|e| {
    tracing::error!(stage = "fetch", error = %e, "refresh aborted");
  })?;

  let records = transform_all(data.countries, &data.rates, rng).inspect_err(|e| {
    tracing::error!(stage = "transform", error = %e, "refresh aborted");
  })?;

  let refreshed_at = Utc::now();
  let countries_processed = store
    .commit_refresh(records, refreshed_at)
    .await
    .map_err(|e| {
      tracing::error!(stage = "commit", error = %e, "refresh rolled back");
      RefreshError::Commit(Box::new(e))
    })?;

  tracing::info!(countries = countries_processed, %refreshed_at, "refresh committed");
  Ok(RefreshReport { countries_processed, refreshed_at })
}
