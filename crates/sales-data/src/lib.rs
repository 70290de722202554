//! Data layer for the coffee shop dashboards.
//!
//! Loads the transactions CSV, filters rows by the user's selection and
//! groups the survivors into the aggregates each view renders.

pub mod aggregator;
pub mod filter;
pub mod reader;

pub use sales_core as core;
