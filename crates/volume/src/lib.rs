//! `trf-volume`: catalog matching and shipped-volume reconciliation.
//!
//! Pure engine crate: receives pre-loaded tables, returns resolved rows and
//! the grand total. No CLI or IO dependencies.

pub mod cache;
pub mod catalog;
pub mod coerce;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod reconcile;
pub mod similarity;

pub use cache::CatalogCache;
pub use catalog::{CatalogIndex, MATCH_THRESHOLD};
pub use config::{CatalogSource, ColumnSelection, JobConfig};
pub use error::VolumeError;
pub use model::{Cell, ResultSet, ResultSummary, Table};
pub use reconcile::{reconcile, reconcile_parallel};
