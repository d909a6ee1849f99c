//! Summary image for the Gazetteer cache.
//!
//! Turns a [`SummarySnapshot`](gazetteer_core::summary::SummarySnapshot) into
//! a fixed-layout 800×400 PNG: title, total count, the top five countries by
//! estimated GDP and the last refresh time.

pub mod error;
mod layout;
mod render;

pub use error::{Error, Result};
pub use layout::{LeaderLine, SummaryLines, format_gdp, format_refreshed_at};
pub use render::{HEIGHT, WIDTH, render_summary, render_summary_blocking};
