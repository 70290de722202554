//! Core types for the coffee shop sales dashboards.
//!
//! Holds the transaction model, dimensions and filter selections, the load
//! error type, CLI settings, and the small parsing and formatting helpers
//! shared by the data and runtime crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{LoadError, Result};
