//! Summary statistics for the dashboard header

use ad_core::config::AnalysisSettings;
use ad_core::data::Row;
use ahash::AHashSet;
use serde::Serialize;

use crate::aggregate::AggregationResult;

/// Headline numbers for the current view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Rows in the dataset
    pub total_rows: usize,

    /// Rows passing the current filters
    pub filtered_count: usize,

    /// Distinct raw values of the group column (0 without grouping)
    pub unique_groups: usize,

    /// Column totalled by `total_sum`, the first sum column
    pub sum_column: Option<String>,

    pub total_sum: f64,
}

/// Compute headline stats.
///
/// With aggregation shown the total comes from the buckets; otherwise from
/// the filtered rows. Either way it covers the whole set, not just what a
/// chart displays.
pub fn compute_stats(
    rows: &[Row],
    filtered: &[Row],
    aggregation: &AggregationResult,
    settings: &AnalysisSettings,
) -> DashboardStats {
    let unique_groups = if settings.is_grouped() {
        rows.iter()
            .map(|row| row.get(&settings.group_by_column))
            .collect::<AHashSet<_>>()
            .len()
    } else {
        0
    };

    let sum_column = settings.sum_columns.first().cloned();
    let total_sum = match &sum_column {
        Some(column) if settings.aggregation_active() => aggregation.total_sum(column),
        Some(column) => filtered.iter().map(|row| row.number(column)).sum(),
        None => 0.0,
    };

    DashboardStats {
        total_rows: rows.len(),
        filtered_count: filtered.len(),
        unique_groups,
        sum_column,
        total_sum,
    }
}
