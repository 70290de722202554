//! Runtime layer for the coffee shop dashboards.
//!
//! Owns the load-once table cache and runs the filter → aggregate pipeline
//! for each interaction.

pub mod dashboard;
pub mod data_manager;

pub use sales_core as core;
pub use sales_data as data;
