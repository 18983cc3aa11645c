//! Equality filters and free-text search over rows

use ad_core::config::FilterConfig;
use ad_core::data::Row;
use ahash::AHashSet;

/// True when `row` satisfies every non-empty equality filter and, if a
/// search term is set, contains it in one of the searchable columns.
/// Comparisons are case-insensitive.
pub fn row_matches(row: &Row, config: &FilterConfig) -> bool {
    for (column, value) in &config.equality_filters {
        if !value.is_empty() && row.text(column).to_lowercase() != value.to_lowercase() {
            return false;
        }
    }

    if config.search_term.is_empty() {
        return true;
    }

    let needle = config.search_term.to_lowercase();
    config
        .searchable_columns
        .iter()
        .any(|column| row.text(column).to_lowercase().contains(&needle))
}

/// Rows passing `config`, in their original order
pub fn filter_rows(rows: &[Row], config: &FilterConfig) -> Vec<Row> {
    if config.is_empty() {
        return rows.to_vec();
    }
    rows.iter().filter(|row| row_matches(row, config)).cloned().collect()
}

/// Distinct non-empty values of `column` as offered by a filter dropdown,
/// in first-seen order
pub fn distinct_values(rows: &[Row], column: &str) -> Vec<String> {
    let mut seen = AHashSet::new();
    rows.iter()
        .filter_map(|row| row.get(column))
        .map(ToString::to_string)
        .filter(|value| !value.is_empty() && seen.insert(value.clone()))
        .collect()
}
