//! [`SqliteStore`]: the SQLite implementation of [`CountryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use gazetteer_core::{
  country::{Country, NewCountry, RefreshMetadata, name_matches},
  store::{CountryQuery, CountryStore, GdpSort},
  summary::{SummaryEntry, SummarySnapshot},
};

use crate::{
  Error, Result,
  encode::{COUNTRY_COLUMNS, CountryRow, EncodedCountry, decode_decimal, decode_dt, encode_dt},
  schema::SCHEMA,
};

const UPSERT_COUNTRY: &str = "
  INSERT INTO countries (
    name, capital, region, population, currency_code,
    exchange_rate, estimated_gdp, flag_url, last_refreshed_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
  ON CONFLICT(name) DO UPDATE SET
    capital           = excluded.capital,
    region            = excluded.region,
    population        = excluded.population,
    currency_code     = excluded.currency_code,
    exchange_rate     = excluded.exchange_rate,
    estimated_gdp     = excluded.estimated_gdp,
    flag_url          = excluded.flag_url,
    last_refreshed_at = excluded.last_refreshed_at";

// Keeps the later of the stored and the new timestamp, so a slow refresh that
// commits after a faster one cannot move the clock backwards.
const STAMP_METADATA: &str = "
  UPDATE refresh_metadata
  SET last_refreshed_at = CASE
    WHEN last_refreshed_at IS NULL OR last_refreshed_at < ?1 THEN ?1
    ELSE last_refreshed_at
  END
  WHERE id = 1";

/// Nulls last, then storage order for ties.
fn order_clause(sort: Option<GdpSort>) -> &'static str {
  match sort {
    Some(GdpSort::Descending) => {
      "ORDER BY estimated_gdp IS NULL, CAST(estimated_gdp AS REAL) DESC, id"
    }
    Some(GdpSort::Ascending) => {
      "ORDER BY estimated_gdp IS NULL, CAST(estimated_gdp AS REAL) ASC, id"
    }
    None => "ORDER BY id",
  }
}

/// Ids of every country whose name contains `fragment`, in storage order.
fn matching_ids(
  conn: &rusqlite::Connection,
  fragment: &str,
) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare("SELECT id, name FROM countries ORDER BY id")?;
  let rows = stmt
    .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(
    rows
      .into_iter()
      .filter(|(_, name)| name_matches(name, fragment))
      .map(|(id, _)| id)
      .collect(),
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gazetteer cache backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CountryStore impl ───────────────────────────────────────────────────────

impl CountryStore for SqliteStore {
  type Error = Error;

  // ── Metadata ──────────────────────────────────────────────────────────────

  async fn ensure_metadata(&self) -> Result<RefreshMetadata> {
    let stored: Option<String> = self
      .conn
      .call(|conn| {
        conn.execute(
          "INSERT OR IGNORE INTO refresh_metadata (id, last_refreshed_at) VALUES (1, NULL)",
          [],
        )?;
        Ok(conn.query_row(
          "SELECT last_refreshed_at FROM refresh_metadata WHERE id = 1",
          [],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(RefreshMetadata {
      last_refreshed_at: stored.as_deref().map(decode_dt).transpose()?,
    })
  }

  async fn metadata(&self) -> Result<Option<RefreshMetadata>> {
    let stored: Option<Option<String>> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT last_refreshed_at FROM refresh_metadata WHERE id = 1",
              [],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    stored
      .map(|at| -> Result<RefreshMetadata> {
        Ok(RefreshMetadata {
          last_refreshed_at: at.as_deref().map(decode_dt).transpose()?,
        })
      })
      .transpose()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit_refresh(
    &self,
    countries: Vec<NewCountry>,
    refreshed_at: DateTime<Utc>,
  ) -> Result<usize> {
    let rows = countries
      .into_iter()
      .map(EncodedCountry::encode)
      .collect::<Result<Vec<_>>>()?;
    let at_str = encode_dt(refreshed_at);

    // `None` means the metadata row was missing and the transaction was
    // dropped (rolled back) without committing.
    let written: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT_COUNTRY)?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.name,
              row.capital,
              row.region,
              row.population,
              row.currency_code,
              row.exchange_rate,
              row.estimated_gdp,
              row.flag_url,
              at_str,
            ])?;
          }
        }

        let stamped = tx.execute(STAMP_METADATA, rusqlite::params![at_str])?;
        if stamped == 0 {
          return Ok(None);
        }

        tx.commit()?;
        Ok(Some(rows.len()))
      })
      .await?;

    let written = written.ok_or(Error::MetadataMissing)?;
    tracing::debug!(written, "refresh transaction committed");
    Ok(written)
  }

  async fn delete_countries(&self, fragment: &str) -> Result<usize> {
    let fragment = fragment.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let ids = matching_ids(&tx, &fragment)?;
        {
          let mut stmt = tx.prepare("DELETE FROM countries WHERE id = ?1")?;
          for id in &ids {
            stmt.execute(rusqlite::params![id])?;
          }
        }
        tx.commit()?;
        Ok(ids.len())
      })
      .await?;

    Ok(deleted)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_countries(&self, query: &CountryQuery) -> Result<Vec<Country>> {
    let region = query.region.clone();
    let currency = query.currency_code.clone();
    let order = order_clause(query.sort);

    let raws: Vec<CountryRow> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {COUNTRY_COLUMNS}
           FROM countries
           WHERE (?1 IS NULL OR region = ?1)
             AND (?2 IS NULL OR currency_code = ?2)
           {order}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![region, currency], CountryRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(CountryRow::into_country).collect()
  }

  async fn find_country(&self, fragment: &str) -> Result<Option<Country>> {
    let fragment = fragment.to_owned();

    let raw: Option<CountryRow> = self
      .conn
      .call(move |conn| {
        let Some(id) = matching_ids(conn, &fragment)?.first().copied() else {
          return Ok(None);
        };
        Ok(
          conn
            .query_row(
              &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE id = ?1"),
              rusqlite::params![id],
              CountryRow::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(CountryRow::into_country).transpose()
  }

  async fn count_countries(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM countries", [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as usize)
  }

  async fn summary(&self, top: usize) -> Result<SummarySnapshot> {
    let limit = top as i64;
    let order = order_clause(Some(GdpSort::Descending));

    let (total, leaders, stamp): (i64, Vec<(String, Option<String>)>, Option<Option<String>>) =
      self
        .conn
        .call(move |conn| {
          // A read transaction keeps the three reads on one snapshot.
          let tx = conn.transaction()?;
          let total: i64 =
            tx.query_row("SELECT COUNT(*) FROM countries", [], |r| r.get(0))?;

          let leaders: Vec<(String, Option<String>)> = {
            let mut stmt = tx.prepare(&format!(
              "SELECT name, estimated_gdp FROM countries {order} LIMIT ?1"
            ))?;
            stmt
              .query_map(rusqlite::params![limit], |r| Ok((r.get(0)?, r.get(1)?)))?
              .collect::<rusqlite::Result<Vec<_>>>()?
          };

          let stamp = tx
            .query_row(
              "SELECT last_refreshed_at FROM refresh_metadata WHERE id = 1",
              [],
              |r| r.get(0),
            )
            .optional()?;

          tx.commit()?;
          Ok((total, leaders, stamp))
        })
        .await?;

    let top = leaders
      .into_iter()
      .map(|(name, gdp)| -> Result<SummaryEntry> {
        Ok(SummaryEntry {
          name,
          estimated_gdp: gdp.as_deref().map(decode_decimal).transpose()?,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(SummarySnapshot {
      total_countries: total as usize,
      top,
      last_refreshed_at: stamp.flatten().as_deref().map(decode_dt).transpose()?,
    })
  }
}
