//! Error type for `gazetteer-render`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("drawing failed: {0}")]
  Draw(String),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("render task panicked or was cancelled: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
