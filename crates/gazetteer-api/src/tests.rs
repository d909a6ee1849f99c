//! Router tests against an in-memory store and a local stand-in for the
//! upstream providers.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
  routing::get,
};
use chrono::Utc;
use gazetteer_core::{country::NewCountry, store::CountryStore};
use gazetteer_store_sqlite::SqliteStore;
use gazetteer_upstream::{UpstreamClient, UpstreamConfig};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt as _;

use crate::{AppState, router};

// ─── Fixtures ─────────────────────────────────────────────────────────────────

fn countries_body() -> Value {
  json!([
    {
      "name": "Testland",
      "capital": "Test City",
      "region": "Europe",
      "population": 1000000,
      "flag": "https://flags.example/tl.svg",
      "currencies": [{ "code": "XYZ", "name": "Test dollar", "symbol": "$" }]
    },
    {
      "name": "Otherland",
      "capital": "Other City",
      "region": "Europe",
      "population": 500,
      "flag": "https://flags.example/ol.svg",
      "currencies": [{ "code": "QQQ" }]
    },
    {
      "name": "Antarctica",
      "region": "Polar",
      "population": 1000,
      "flag": "https://flags.example/aq.svg"
    }
  ])
}

fn rates_body() -> Value {
  json!({ "result": "success", "base_code": "USD", "rates": { "USD": 1, "XYZ": 2.0 } })
}

/// Serve the fake providers on an ephemeral port and return the base URL.
async fn upstream() -> String {
  let app = Router::new()
    .route("/countries", get(|| async { Json(countries_body()) }))
    .route("/rates", get(|| async { Json(rates_body()) }))
    .route("/broken", get(|| async { StatusCode::BAD_GATEWAY }))
    .route(
      "/rates-error",
      get(|| async { Json(json!({ "result": "error", "error-type": "quota-reached" })) }),
    )
    .route(
      "/no-population",
      get(|| async { Json(json!([{ "name": "Nowhere", "region": "Europe" }])) }),
    );

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{addr}")
}

struct Harness {
  state: AppState<SqliteStore>,
  _dir:  TempDir,
}

async fn fresh_store() -> Arc<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.ensure_metadata().await.unwrap();
  Arc::new(store)
}

impl Harness {
  async fn new() -> Self {
    Self::with_store(fresh_store().await, "http://127.0.0.1:9", "/countries", "/rates")
  }

  /// A harness whose refresh talks to `base` at the given paths.
  fn with_store(store: Arc<SqliteStore>, base: &str, countries: &str, rates: &str) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("cache").join("summary.png");
    Self::build(store, base, countries, rates, image_path, dir)
  }

  /// Like [`Harness::with_store`] with the default provider paths, rendering
  /// to `image_path`.
  fn with_image_path(store: Arc<SqliteStore>, base: &str, image_path: PathBuf) -> Self {
    let dir = tempfile::tempdir().unwrap();
    Self::build(store, base, "/countries", "/rates", image_path, dir)
  }

  fn build(
    store: Arc<SqliteStore>,
    base: &str,
    countries: &str,
    rates: &str,
    image_path: PathBuf,
    dir: TempDir,
  ) -> Self {
    let upstream = UpstreamClient::new(UpstreamConfig {
      countries_url: format!("{base}{countries}"),
      rates_url:     format!("{base}{rates}"),
      timeout:       Duration::from_secs(2),
    })
    .unwrap();
    let state = AppState::new(store, upstream, image_path);
    Self { state, _dir: dir }
  }

  async fn send(&self, method: &str, uri: &str) -> Response {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .body(Body::empty())
      .unwrap();
    router(self.state.clone()).oneshot(req).await.unwrap()
  }

  async fn json(&self, method: &str, uri: &str) -> (StatusCode, Value) {
    let resp = self.send(method, uri).await;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
  }

  async fn wait_for_image(&self) {
    for _ in 0..100 {
      if self.state.image_path.exists() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("summary image was never rendered");
  }
}

fn seed(name: &str, region: &str, gdp: Option<i64>) -> NewCountry {
  NewCountry {
    name:          name.into(),
    capital:       None,
    region:        Some(region.into()),
    population:    1_000,
    currency_code: gdp.map(|_| "EUR".into()),
    exchange_rate: gdp.map(|_| 1.into()),
    estimated_gdp: gdp.map(Into::into),
    flag_url:      None,
  }
}

async fn seeded() -> Harness {
  let h = Harness::new().await;
  h.state
    .store
    .commit_refresh(
      vec![
        seed("France", "Europe", Some(2_500)),
        seed("Iceland", "Europe", None),
        seed("Germany", "Europe", Some(9_100)),
        seed("Nigeria", "Africa", Some(300)),
      ],
      Utc::now(),
    )
    .await
    .unwrap();
  h
}

/// Each listed country without the fields a refresh is expected to change.
fn without_refresh_fields(rows: &Value) -> Vec<Value> {
  rows
    .as_array()
    .unwrap()
    .iter()
    .map(|c| {
      let mut c = c.clone();
      let fields = c.as_object_mut().unwrap();
      fields.remove("estimated_gdp");
      fields.remove("last_refreshed_at");
      c
    })
    .collect()
}

fn names(body: &Value) -> Vec<&str> {
  body
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["name"].as_str().unwrap())
    .collect()
}

// ─── Root & status ────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_reports_liveness() {
  let h = Harness::new().await;
  let resp = h.send("GET", "/").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert_eq!(&bytes[..], b"API is running...");
}

#[tokio::test]
async fn status_before_any_refresh() {
  let h = Harness::new().await;
  let (status, body) = h.json("GET", "/api/status").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "total_countries": 0, "last_refreshed_at": null }));
}

#[tokio::test]
async fn status_without_metadata_is_404() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let h = Harness::with_store(store, "http://127.0.0.1:9", "/countries", "/rates");
  let (status, body) = h.json("GET", "/api/status").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("run a refresh"));
}

// ─── Refresh ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_caches_countries_and_renders() {
  let base = upstream().await;
  let h = Harness::with_store(fresh_store().await, &base, "/countries", "/rates");

  let (status, body) = h.json("POST", "/api/countries/refresh").await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["countries_processed"], 3);

  let (_, testland) = h.json("GET", "/api/countries/testland").await;
  assert_eq!(testland["currency_code"], "XYZ");
  assert_eq!(testland["exchange_rate"], 2.0);
  let gdp = testland["estimated_gdp"].as_f64().unwrap();
  assert!((500_000_000.0..=1_000_000_000.0).contains(&gdp), "{gdp}");

  // Currency without a published rate.
  let (_, other) = h.json("GET", "/api/countries/otherland").await;
  assert_eq!(other["currency_code"], "QQQ");
  assert_eq!(other["exchange_rate"], Value::Null);
  assert_eq!(other["estimated_gdp"], Value::Null);

  // No currencies at all.
  let (_, polar) = h.json("GET", "/api/countries/antarctica").await;
  assert_eq!(polar["currency_code"], Value::Null);
  assert_eq!(polar["estimated_gdp"], Value::Null);

  let (_, status_body) = h.json("GET", "/api/status").await;
  assert_eq!(status_body["total_countries"], 3);
  assert!(status_body["last_refreshed_at"].is_string());

  h.wait_for_image().await;
  let resp = h.send("GET", "/api/countries/image").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn repeated_refresh_upserts_by_name() {
  let base = upstream().await;
  let h = Harness::with_store(fresh_store().await, &base, "/countries", "/rates");

  h.json("POST", "/api/countries/refresh").await;
  let (_, first) = h.json("GET", "/api/status").await;
  let (_, rows_first) = h.json("GET", "/api/countries").await;
  h.json("POST", "/api/countries/refresh").await;
  let (_, second) = h.json("GET", "/api/status").await;
  let (_, rows_second) = h.json("GET", "/api/countries").await;

  assert_eq!(second["total_countries"], 3);
  assert!(
    second["last_refreshed_at"].as_str().unwrap()
      >= first["last_refreshed_at"].as_str().unwrap()
  );

  // Same ids, capitals, regions, populations, currencies, rates and flags.
  let before = without_refresh_fields(&rows_first);
  assert_eq!(before.len(), 3);
  assert_eq!(before, without_refresh_fields(&rows_second));
  for row in before {
    for field in [
      "id", "name", "capital", "region", "population", "currency_code", "exchange_rate", "flag_url",
    ] {
      assert!(row.get(field).is_some(), "{field} missing from {row}");
    }
  }
}

#[tokio::test]
async fn render_failure_does_not_fail_refresh() {
  let base = upstream().await;
  let dir = tempfile::tempdir().unwrap();
  // A regular file where the cache directory should be.
  let blocker = dir.path().join("cache");
  std::fs::write(&blocker, b"not a directory").unwrap();
  let h = Harness::with_image_path(fresh_store().await, &base, blocker.join("summary.png"));

  let (status, body) = h.json("POST", "/api/countries/refresh").await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["countries_processed"], 3);

  // Let the worker attempt (and fail) the render, then refresh again.
  tokio::time::sleep(Duration::from_millis(300)).await;
  assert!(!h.state.image_path.exists());

  let (status, body) = h.json("POST", "/api/countries/refresh").await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["countries_processed"], 3);
}

#[tokio::test]
async fn upstream_failure_is_503_and_writes_nothing() {
  let base = upstream().await;
  let h = seeded().await;
  let (_, before) = h.json("GET", "/api/status").await;
  let (_, rows_before) = h.json("GET", "/api/countries").await;

  let failing = Harness::with_store(h.state.store.clone(), &base, "/broken", "/rates");
  let (status, body) = failing.json("POST", "/api/countries/refresh").await;

  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(
    body,
    json!({
      "error": "External data source unavailable",
      "details": "Could not fetch data from RestCountries",
    })
  );

  let (_, after) = h.json("GET", "/api/status").await;
  let (_, rows_after) = h.json("GET", "/api/countries").await;
  assert_eq!(before, after);
  assert_eq!(rows_before, rows_after);
}

#[tokio::test]
async fn rate_provider_error_payload_is_503() {
  let base = upstream().await;
  let h = Harness::with_store(fresh_store().await, &base, "/countries", "/rates-error");

  let (status, body) = h.json("POST", "/api/countries/refresh").await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body["details"], "Could not fetch data from ExchangeRate-API");

  let (_, status_body) = h.json("GET", "/api/status").await;
  assert_eq!(status_body["total_countries"], 0);
  assert_eq!(status_body["last_refreshed_at"], Value::Null);
}

#[tokio::test]
async fn invalid_record_is_500_and_rolls_back() {
  let base = upstream().await;
  let h = Harness::with_store(fresh_store().await, &base, "/no-population", "/rates");

  let (status, body) = h.json("POST", "/api/countries/refresh").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body, json!({ "error": "Internal server error" }));

  let (_, status_body) = h.json("GET", "/api/status").await;
  assert_eq!(status_body["total_countries"], 0);
}

// ─── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_region_and_sorts_nulls_last() {
  let h = seeded().await;
  let (status, body) = h.json("GET", "/api/countries?region=Europe&sort=gdp_desc").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), ["Germany", "France", "Iceland"]);

  let (_, body) = h.json("GET", "/api/countries?region=Europe&sort=gdp_asc").await;
  assert_eq!(names(&body), ["France", "Germany", "Iceland"]);
}

#[tokio::test]
async fn list_filters_by_currency() {
  let h = seeded().await;
  let (_, body) = h.json("GET", "/api/countries?currency=EUR&sort=gdp_asc").await;
  assert_eq!(names(&body), ["Nigeria", "France", "Germany"]);
}

#[tokio::test]
async fn unknown_sort_keeps_storage_order() {
  let h = seeded().await;
  let (status, body) = h.json("GET", "/api/countries?sort=bogus").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), ["France", "Iceland", "Germany", "Nigeria"]);
}

// ─── Get / delete by name ─────────────────────────────────────────────────────

#[tokio::test]
async fn get_matches_case_insensitive_substring() {
  let h = seeded().await;
  let (status, body) = h.json("GET", "/api/countries/ERMAN").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Germany");
  assert_eq!(body["estimated_gdp"], 9100.0);
}

#[tokio::test]
async fn get_unknown_is_404() {
  let h = seeded().await;
  let (status, body) = h.json("GET", "/api/countries/atlantis").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "error": "Country not found" }));
}

#[tokio::test]
async fn delete_nonexistent_is_404_and_changes_nothing() {
  let h = seeded().await;
  let (status, _) = h.json("DELETE", "/api/countries/nonexistent").await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, body) = h.json("GET", "/api/status").await;
  assert_eq!(body["total_countries"], 4);
}

#[tokio::test]
async fn delete_removes_every_match() {
  let h = seeded().await;
  let resp = h.send("DELETE", "/api/countries/AN").await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let (_, body) = h.json("GET", "/api/countries").await;
  assert_eq!(names(&body), ["Nigeria"]);

  let (status, _) = h.json("GET", "/api/countries/germany").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Image ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_is_404_until_rendered() {
  let h = Harness::new().await;
  let (status, body) = h.json("GET", "/api/countries/image").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("Summary image not found"));
}

#[tokio::test]
async fn image_is_served_after_a_render_request() {
  let h = seeded().await;
  assert!(h.state.renderer.request());
  h.wait_for_image().await;

  let resp = h.send("GET", "/api/countries/image").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}
