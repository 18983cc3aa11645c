//! Table preview

use ad_core::config::{AnalysisSettings, DisplayLimits};
use ad_core::data::Row;
use serde::Serialize;

use crate::aggregate::AggregationResult;

/// Rows the table and export present: flattened buckets while aggregation is
/// shown, otherwise the filtered rows
pub fn visible_rows(filtered: &[Row], aggregation: &AggregationResult, settings: &AnalysisSettings) -> Vec<Row> {
    if settings.aggregation_active() {
        aggregation.to_rows(&settings.group_by_column)
    } else {
        filtered.to_vec()
    }
}

/// A capped slice of the visible rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,

    /// Visible rows before the preview cap
    pub total_rows: usize,
}

impl TableView {
    pub fn new(columns: Vec<String>, mut rows: Vec<Row>, limits: &DisplayLimits) -> Self {
        let total_rows = rows.len();
        rows.truncate(limits.table_rows);
        Self {
            columns,
            rows,
            total_rows,
        }
    }

    pub fn shown(&self) -> usize {
        self.rows.len()
    }

    /// Cell text as displayed; null renders as `-`
    pub fn cell(&self, row: usize, column: &str) -> String {
        match self.rows.get(row).and_then(|r| r.get(column)) {
            Some(value) if !value.is_empty_text() => value.to_string(),
            _ => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use ad_core::data::CellValue;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                [
                    ("Region", Some(CellValue::from(if i % 2 == 0 { "East" } else { "West" }))),
                    ("Sales", Some(CellValue::from(i as f64))),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    #[test]
    fn test_visible_rows_switch_on_aggregation() {
        let data = rows(4);
        let mut settings = AnalysisSettings {
            group_by_column: "Region".into(),
            sum_columns: vec!["Sales".into()],
            show_aggregated: true,
            ..Default::default()
        };
        let aggregation = aggregate(&data, "Region", &settings.sum_columns);

        let visible = visible_rows(&data, &aggregation, &settings);
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].text("Region"), "West");
        assert_eq!(visible[1].number("Sales"), 4.0);

        settings.show_aggregated = false;
        assert_eq!(visible_rows(&data, &aggregation, &settings).len(), 4);
    }

    #[test]
    fn test_preview_is_capped() {
        let table = TableView::new(vec!["Region".into()], rows(150), &DisplayLimits::default());
        assert_eq!(table.shown(), 100);
        assert_eq!(table.total_rows, 150);
        assert_eq!(table.cell(0, "Region"), "East");
        assert_eq!(table.cell(0, "Missing"), "-");
        assert_eq!(table.cell(500, "Region"), "-");
    }
}
