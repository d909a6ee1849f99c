//! Error type for `gazetteer-upstream`.

use std::fmt;

use thiserror::Error;

/// Which upstream provider a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSource {
  Countries,
  ExchangeRates,
}

impl fmt::Display for UpstreamSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Countries => "RestCountries",
      Self::ExchangeRates => "ExchangeRate-API",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// Network failure, timeout, non-success status or undecodable body.
  #[error("could not fetch data from {upstream}: {reason}")]
  Unavailable {
    upstream: UpstreamSource,
    #[source]
    reason:   reqwest::Error,
  },

  /// The provider answered but reported an error in its payload.
  #[error("{upstream} rejected the request: {reason}")]
  Rejected {
    upstream: UpstreamSource,
    reason:   String,
  },

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),
}

impl Error {
  /// The provider at fault, if the failure is attributable to one.
  pub fn upstream(&self) -> Option<UpstreamSource> {
    match self {
      Self::Unavailable { upstream, .. } | Self::Rejected { upstream, .. } => {
        Some(*upstream)
      }
      Self::Client(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
