//! Grouped aggregation
//!
//! Rows are grouped by the stringified value of a key column. Each bucket
//! counts its rows and totals the chosen sum columns. Buckets keep the order
//! in which their keys were first seen.

use ad_core::data::{CellValue, Row};
use indexmap::IndexMap;
use serde::Serialize;

/// Bucket key for rows whose group cell is null or empty
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Field name under which a bucket exposes its row count
pub const COUNT_FIELD: &str = "count";

/// One group's accumulated record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub sums: IndexMap<String, f64>,
}

impl Bucket {
    fn new(sum_columns: &[String]) -> Self {
        Self {
            count: 0,
            sums: sum_columns.iter().map(|c| (c.clone(), 0.0)).collect(),
        }
    }

    /// Sum for `column`, or the row count for `"count"`
    pub fn value(&self, column: &str) -> Option<f64> {
        if column == COUNT_FIELD {
            return Some(self.count as f64);
        }
        self.sums.get(column).copied()
    }

    /// The bucket as row fields: `count` followed by each sum
    pub fn to_fields(&self) -> Row {
        let mut row = Row::with_capacity(self.sums.len() + 1);
        row.insert(COUNT_FIELD, Some(CellValue::Number(self.count as f64)));
        for (column, total) in &self.sums {
            row.insert(column.clone(), Some(CellValue::Number(*total)));
        }
        row
    }
}

/// Buckets keyed by group value, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregationResult {
    buckets: IndexMap<String, Bucket>,
}

impl AggregationResult {
    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Rows across all buckets
    pub fn total_count(&self) -> usize {
        self.buckets.values().map(|b| b.count).sum()
    }

    /// Total of one sum column across all buckets
    pub fn total_sum(&self, column: &str) -> f64 {
        self.buckets.values().filter_map(|b| b.sums.get(column)).sum()
    }

    /// Flatten buckets into rows of `{group_by: key, count, sums...}`
    pub fn to_rows(&self, group_by_column: &str) -> Vec<Row> {
        self.buckets
            .iter()
            .map(|(key, bucket)| {
                let mut row = Row::with_capacity(bucket.sums.len() + 2);
                row.insert(group_by_column, Some(CellValue::Text(key.clone())));
                for (column, value) in bucket.to_fields().iter() {
                    row.insert(column, value.cloned());
                }
                row
            })
            .collect()
    }
}

/// Group `rows` by `group_by_column`, counting rows and totalling
/// `sum_columns` per group.
///
/// An empty group column or empty input yields an empty result. Missing or
/// non-numeric values add zero.
pub fn aggregate(rows: &[Row], group_by_column: &str, sum_columns: &[String]) -> AggregationResult {
    let mut result = AggregationResult::default();
    if group_by_column.is_empty() || rows.is_empty() {
        return result;
    }

    for row in rows {
        let bucket = result
            .buckets
            .entry(group_key(row, group_by_column))
            .or_insert_with(|| Bucket::new(sum_columns));

        bucket.count += 1;
        for column in sum_columns {
            if let Some(total) = bucket.sums.get_mut(column) {
                *total += row.number(column);
            }
        }
    }

    result
}

fn group_key(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(value) if !value.is_empty_text() => value.to_string(),
        _ => UNKNOWN_GROUP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(region: Option<&str>, sales: Option<CellValue>) -> Row {
        [
            ("Region", region.map(CellValue::from)),
            ("Sales", sales),
        ]
        .into_iter()
        .collect()
    }

    fn sales_rows() -> Vec<Row> {
        vec![
            row(Some("East"), Some(10.0.into())),
            row(Some("East"), Some(5.0.into())),
            row(Some("West"), Some(7.0.into())),
        ]
    }

    #[test]
    fn test_groups_and_sums() {
        let result = aggregate(&sales_rows(), "Region", &["Sales".to_string()]);

        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["East", "West"]);
        let east = result.get("East").unwrap();
        assert_eq!(east.count, 2);
        assert_eq!(east.value("Sales"), Some(15.0));
        let west = result.get("West").unwrap();
        assert_eq!(west.count, 1);
        assert_eq!(west.value("Sales"), Some(7.0));
    }

    #[test]
    fn test_no_grouping_is_empty() {
        assert!(aggregate(&sales_rows(), "", &["Sales".to_string()]).is_empty());
        assert!(aggregate(&[], "Region", &[]).is_empty());
    }

    #[test]
    fn test_unknown_and_non_numeric() {
        let rows = vec![
            row(None, Some("abc".into())),
            row(Some(""), Some(3.0.into())),
            row(Some("North"), None),
        ];
        let result = aggregate(&rows, "Region", &["Sales".to_string(), "Missing".to_string()]);

        let unknown = result.get(UNKNOWN_GROUP).unwrap();
        assert_eq!(unknown.count, 2);
        assert_eq!(unknown.value("Sales"), Some(3.0));
        assert_eq!(unknown.value("Missing"), Some(0.0));
        assert_eq!(result.get("North").unwrap().value("Sales"), Some(0.0));
    }

    #[test]
    fn test_numeric_keys_are_stringified() {
        let rows: Vec<Row> = vec![
            [("Year", Some(CellValue::from(2024.0)))].into_iter().collect(),
            [("Year", Some(CellValue::from("2024")))].into_iter().collect(),
        ];
        let result = aggregate(&rows, "Year", &[]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("2024").unwrap().count, 2);
    }

    #[test]
    fn test_to_rows() {
        let result = aggregate(&sales_rows(), "Region", &["Sales".to_string()]);
        let rows = result.to_rows("Region");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["Region", "count", "Sales"]);
        assert_eq!(rows[0].text("Region"), "East");
        assert_eq!(rows[0].number("count"), 2.0);
        assert_eq!(rows[0].number("Sales"), 15.0);
    }

    proptest! {
        #[test]
        fn bucket_counts_cover_every_row(
            keys in proptest::collection::vec(prop_oneof![Just(None), "[a-c]".prop_map(Some)], 0..50)
        ) {
            let rows: Vec<Row> = keys
                .iter()
                .map(|k| row(k.as_deref(), Some(1.0.into())))
                .collect();
            let result = aggregate(&rows, "Region", &["Sales".to_string()]);

            prop_assert_eq!(result.total_count(), rows.len());
            prop_assert_eq!(result.total_sum("Sales"), rows.len() as f64);
            prop_assert_eq!(aggregate(&rows, "Region", &["Sales".to_string()]), result);
        }
    }
}
