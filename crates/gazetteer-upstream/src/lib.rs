//! Async client for the two upstream providers: a country directory and a
//! USD exchange-rate table.
//!
//! Both requests are issued together and either both succeed or the fetch
//! fails as a whole, naming the provider that failed.

mod client;
pub mod error;

pub use client::{
  DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL, DEFAULT_TIMEOUT, UpstreamClient,
  UpstreamConfig, UpstreamData,
};
pub use error::{Error, Result, UpstreamSource};
