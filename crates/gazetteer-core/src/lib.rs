//! Core types and trait definitions for the Gazetteer country cache.
//!
//! This crate has no HTTP or database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod country;
pub mod error;
pub mod store;
pub mod summary;
pub mod transform;

pub use error::{Error, Result};
