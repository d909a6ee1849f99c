//! SQL schema for the Gazetteer SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per country, upserted on name by each refresh.
-- Decimals are stored as their exact text form.
CREATE TABLE IF NOT EXISTS countries (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT    NOT NULL UNIQUE,
    capital           TEXT,
    region            TEXT,
    population        INTEGER NOT NULL CHECK (population >= 0),
    currency_code     TEXT,
    exchange_rate     TEXT,            -- local currency per 1 USD, 6 dp
    estimated_gdp     TEXT,            -- 2 dp; NULL when not derivable
    flag_url          TEXT,
    last_refreshed_at TEXT    NOT NULL -- RFC 3339 UTC; set on every write
);

-- Singleton: at most one row, id = 1. Never deleted.
CREATE TABLE IF NOT EXISTS refresh_metadata (
    id                INTEGER PRIMARY KEY CHECK (id = 1),
    last_refreshed_at TEXT
);

CREATE INDEX IF NOT EXISTS countries_region_idx   ON countries(region);
CREATE INDEX IF NOT EXISTS countries_currency_idx ON countries(currency_code);

PRAGMA user_version = 1;
";
