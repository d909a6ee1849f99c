//! JSON REST API for Gazetteer.
//!
//! Exposes an axum [`Router`] backed by any [`CountryStore`], plus the refresh
//! pipeline and the background worker that re-renders the summary image after
//! each successful refresh.

pub mod config;
pub mod countries;
pub mod error;
pub mod refresh;
pub mod status;
pub mod worker;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use gazetteer_core::store::CountryStore;
use gazetteer_upstream::UpstreamClient;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use worker::RenderQueue;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: CountryStore> {
  pub store:      Arc<S>,
  pub upstream:   UpstreamClient,
  pub renderer:   RenderQueue,
  pub image_path: Arc<PathBuf>,
}

impl<S> AppState<S>
where
  S: CountryStore + 'static,
{
  /// Assemble the state and spawn the render worker. Must be called from
  /// inside a tokio runtime.
  pub fn new(store: Arc<S>, upstream: UpstreamClient, image_path: PathBuf) -> Self {
    let renderer = RenderQueue::spawn(store.clone(), image_path.clone());
    Self {
      store,
      upstream,
      renderer,
      image_path: Arc::new(image_path),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `GET /` plus everything under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CountryStore + Clone + 'static,
{
  Router::new()
    .route("/", get(root))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// The `/api` routes alone, already bound to `state`.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: CountryStore + Clone + 'static,
{
  Router::new()
    .route("/countries", get(countries::list::<S>))
    .route("/countries/refresh", post(countries::refresh::<S>))
    .route("/countries/image", get(countries::image::<S>))
    .route(
      "/countries/{name}",
      get(countries::get_one::<S>).delete(countries::delete_one::<S>),
    )
    .route("/status", get(status::handler::<S>))
    .with_state(state)
}

async fn root() -> &'static str { "API is running..." }

#[cfg(test)]
mod tests;
