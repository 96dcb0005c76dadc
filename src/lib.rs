//! Lead Dashboard core
//!
//! Race-safe lead fetching, a memoized sort/filter/aggregate pipeline, CSV
//! export and fire-and-forget usage telemetry. The binary in `main.rs` drives
//! it from the command line; everything here is usable on its own.

pub mod command;
pub mod config;
pub mod dashboard;
pub mod endpoints;
pub mod errors;
pub mod export;
pub mod fetch_controller;
pub mod lead_source;
pub mod metrics;
pub mod pipeline;
pub mod preferences;
pub mod render;
pub mod session;
pub mod structured_logging;
pub mod telemetry;
pub mod test_utils;
pub mod types;
pub mod view_state;

// Re-export commonly used types
pub use dashboard::Dashboard;
pub use errors::DashboardError;
pub use fetch_controller::{FetchController, FetchOutcome};
pub use pipeline::{DerivationPipeline, DerivedView};
pub use types::{FilterState, Lead, LeadCollection, LeadField, SortDirection, SortState, ViewMode};
