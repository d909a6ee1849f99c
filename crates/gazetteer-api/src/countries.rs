//! Handlers for `/countries` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/countries/refresh` | 503 if either provider fails |
//! | `GET`    | `/countries` | `?region=`, `?currency=`, `?sort=gdp_asc\|gdp_desc` |
//! | `GET`    | `/countries/image` | PNG, 404 until the first render |
//! | `GET`    | `/countries/:name` | case-insensitive substring, 404 if none |
//! | `DELETE` | `/countries/:name` | deletes every match, 404 if none |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use gazetteer_core::{
  country::Country,
  store::{CountryQuery, CountryStore, GdpSort},
};
use rand::{SeedableRng as _, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, refresh::run_refresh};

const COUNTRY_NOT_FOUND: &str = "Country not found";

// ─── Refresh ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RefreshBody {
  pub message:             &'static str,
  pub countries_processed: usize,
}

/// `POST /countries/refresh`
pub async fn refresh<S>(State(state): State<AppState<S>>) -> Result<Json<RefreshBody>, ApiError>
where
  S: CountryStore + Clone + 'static,
{
  let mut rng = StdRng::from_entropy();
  let report = run_refresh(state.store.as_ref(), &state.upstream, &mut rng).await?;
  state.renderer.request();

  Ok(Json(RefreshBody {
    message:             "Country data refreshed and cached successfully. Image generation started.",
    countries_processed: report.countries_processed,
  }))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub region:   Option<String>,
  pub currency: Option<String>,
  pub sort:     Option<String>,
}

impl ListParams {
  /// Empty values are treated as absent; an unknown `sort` is ignored.
  fn into_query(self) -> CountryQuery {
    let present = |v: Option<String>| v.filter(|s| !s.is_empty());
    CountryQuery {
      region:        present(self.region),
      currency_code: present(self.currency),
      sort:          self.sort.as_deref().and_then(GdpSort::parse),
    }
  }
}

/// `GET /countries[?region=<r>][&currency=<c>][&sort=gdp_asc|gdp_desc]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Country>>, ApiError>
where
  S: CountryStore + Clone + 'static,
{
  let query = params.into_query();
  let countries = state
    .store
    .list_countries(&query)
    .await
    .map_err(ApiError::internal)?;
  Ok(Json(countries))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /countries/:name`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<Json<Country>, ApiError>
where
  S: CountryStore + Clone + 'static,
{
  state
    .store
    .find_country(&name)
    .await
    .map_err(ApiError::internal)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(COUNTRY_NOT_FOUND.into()))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /countries/:name`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: CountryStore + Clone + 'static,
{
  let removed = state
    .store
    .delete_countries(&name)
    .await
    .map_err(ApiError::internal)?;

  if removed == 0 {
    return Err(ApiError::NotFound(COUNTRY_NOT_FOUND.into()));
  }
  tracing::info!(fragment = %name, removed, "countries deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Image ────────────────────────────────────────────────────────────────────

/// `GET /countries/image`
pub async fn image<S>(State(state): State<AppState<S>>) -> Result<impl IntoResponse, ApiError>
where
  S: CountryStore + Clone + 'static,
{
  match tokio::fs::read(state.image_path.as_ref()).await {
    Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::NotFound(
      "Summary image not found. Please run a refresh first.".into(),
    )),
    Err(e) => Err(ApiError::internal(e)),
  }
}
