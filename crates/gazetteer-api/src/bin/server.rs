//! Gazetteer server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), overlays
//! `GAZETTEER_*` environment variables, opens the SQLite cache and serves the
//! JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use gazetteer_api::{AppState, ServerConfig};
use gazetteer_core::store::CountryStore as _;
use gazetteer_store_sqlite::SqliteStore;
use gazetteer_upstream::UpstreamClient;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Gazetteer country cache server")]
struct Cli {
  /// Path to the TOML configuration file. Missing is fine.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GAZETTEER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let metadata = store
    .ensure_metadata()
    .await
    .context("failed to initialise refresh metadata")?;
  match metadata.last_refreshed_at {
    Some(at) => tracing::info!(last_refreshed_at = %at, "cache loaded"),
    None => tracing::info!("cache is empty; POST /api/countries/refresh to populate it"),
  }

  let upstream =
    UpstreamClient::new(server_cfg.upstream()).context("failed to build upstream client")?;

  let image_path = expand_tilde(&server_cfg.image_path());
  let state = AppState::new(Arc::new(store), upstream, image_path);

  let app = gazetteer_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
