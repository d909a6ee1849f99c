//! Background rendering of the summary image.
//!
//! A single worker task owns rendering. Requests go through a channel of
//! capacity one: while a job is already waiting, further requests are
//! dropped, since the waiting job reads whatever state is committed when it
//! runs.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use gazetteer_core::{store::CountryStore, summary::SUMMARY_TOP_N};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Error)]
pub enum RenderJobError {
  #[error("failed to read summary: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Render(#[from] gazetteer_render::Error),
}

/// Read a summary snapshot from `store` and render it to `target`.
pub async fn render_current<S>(store: &S, target: &Path) -> Result<(), RenderJobError>
where
  S: CountryStore,
{
  let snapshot = store
    .summary(SUMMARY_TOP_N)
    .await
    .map_err(|e| RenderJobError::Store(Box::new(e)))?;
  gazetteer_render::render_summary(snapshot, target.to_path_buf()).await?;
  Ok(())
}

/// Handle to the render worker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RenderQueue {
  tx: mpsc::Sender<()>,
}

impl RenderQueue {
  /// Spawn the worker on the current tokio runtime. It stops once every
  /// handle has been dropped.
  pub fn spawn<S>(store: Arc<S>, target: PathBuf) -> Self
  where
    S: CountryStore + 'static,
  {
    let (tx, mut rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
      while rx.recv().await.is_some() {
        tracing::info!(path = %target.display(), "rendering summary image");
        match render_current(store.as_ref(), &target).await {
          Ok(()) => tracing::info!(path = %target.display(), "summary image written"),
          Err(e) => tracing::error!(stage = "render", error = %e, "summary render failed"),
        }
      }
      tracing::debug!("render worker stopped");
    });

    Self { tx }
  }

  /// Ask for a re-render. Returns `false` if a job was already waiting.
  pub fn request(&self) -> bool {
    match self.tx.try_send(()) {
      Ok(()) => true,
      Err(TrySendError::Full(())) => {
        tracing::debug!("render already queued");
        false
      }
      Err(TrySendError::Closed(())) => {
        tracing::warn!("render worker is gone; image will not be updated");
        false
      }
    }
  }
}
