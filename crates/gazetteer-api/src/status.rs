//! `GET /status`

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use gazetteer_core::store::CountryStore;
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct StatusBody {
  pub total_countries:   usize,
  pub last_refreshed_at: Option<DateTime<Utc>>,
}

pub async fn handler<S>(State(state): State<AppState<S>>) -> Result<Json<StatusBody>, ApiError>
where
  S: CountryStore + Clone + 'static,
{
  let metadata = state
    .store
    .metadata()
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| {
      ApiError::NotFound("Status information not available. Please run a refresh.".into())
    })?;

  let total_countries = state
    .store
    .count_countries()
    .await
    .map_err(ApiError::internal)?;

  Ok(Json(StatusBody {
    total_countries,
    last_refreshed_at: metadata.last_refreshed_at,
  }))
}
