//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gazetteer_upstream::UpstreamSource;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// One of the upstream providers failed; nothing was written.
  #[error("could not fetch data from {0}")]
  UpstreamUnavailable(UpstreamSource),

  /// Store, transform or I/O failure. Details are logged, never returned.
  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::UpstreamUnavailable(source) => (
        StatusCode::SERVICE_UNAVAILABLE,
        json!({
          "error": "External data source unavailable",
          "details": format!("Could not fetch data from {source}"),
        }),
      ),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "Internal server error" }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
