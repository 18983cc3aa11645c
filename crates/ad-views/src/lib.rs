//! Dashboard computations over loaded datasets
//!
//! Filtering, aggregation, chart projection, stats, the table preview and
//! CSV export. [`pipeline`] ties them together.

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod plots;
pub mod stats;
pub mod tables;

use thiserror::Error;

pub use aggregate::{aggregate, AggregationResult, Bucket, UNKNOWN_GROUP};
pub use export::{export_csv, export_file_name, write_export, write_export_to};
pub use filter::{distinct_values, filter_rows, row_matches};
pub use pipeline::{compute, DashboardView, Pipeline, PipelineConfig};
pub use plots::{chart_data, ChartData, ChartPoint, ChartSource};
pub use stats::{compute_stats, DashboardStats};
pub use tables::{visible_rows, TableView};

/// Errors raised while writing view output
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
