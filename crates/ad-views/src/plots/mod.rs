//! Chart projection
//!
//! Aggregated buckets or filtered rows are mapped to uniform
//! `{name, value}` points. Only the first points up to the chart type's
//! display cap are handed to rendering.

use ad_core::config::{ChartSettings, ChartType, DisplayLimits};
use ad_core::data::Row;
use serde::Serialize;

use crate::aggregate::AggregationResult;

/// One plotted point plus the fields behind it (for tooltips)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
    pub fields: Row,
}

/// What a chart is drawn from
#[derive(Debug, Clone, Copy)]
pub enum ChartSource<'a> {
    Aggregated(&'a AggregationResult),
    Rows(&'a [Row]),
}

/// Points ready for a charting surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub chart_type: ChartType,
    pub title: String,
    pub points: Vec<ChartPoint>,
    /// Points before the display cap was applied
    pub total_points: usize,
}

impl ChartData {
    pub fn is_truncated(&self) -> bool {
        self.points.len() < self.total_points
    }
}

/// One point per bucket; the value is the bucket's `y_axis_column` total
pub fn project_aggregation(result: &AggregationResult, y_axis_column: &str) -> Vec<ChartPoint> {
    result
        .iter()
        .map(|(key, bucket)| ChartPoint {
            name: key.to_string(),
            value: bucket.value(y_axis_column).unwrap_or(0.0),
            fields: bucket.to_fields(),
        })
        .collect()
}

/// One point per row with a non-empty category
pub fn project_rows(rows: &[Row], x_axis_column: &str, y_axis_column: &str) -> Vec<ChartPoint> {
    rows.iter()
        .filter_map(|row| {
            let name = row.text(x_axis_column);
            if name.is_empty() {
                return None;
            }
            Some(ChartPoint {
                name,
                value: row.number(y_axis_column),
                fields: row.clone(),
            })
        })
        .collect()
}

/// Project `source` and truncate to the display cap of the chart type
pub fn chart_data(source: ChartSource<'_>, settings: &ChartSettings, limits: &DisplayLimits) -> ChartData {
    let mut points = match source {
        ChartSource::Aggregated(result) => project_aggregation(result, &settings.y_axis_column),
        ChartSource::Rows(rows) => project_rows(rows, &settings.x_axis_column, &settings.y_axis_column),
    };

    let total_points = points.len();
    points.truncate(settings.chart_type.display_cap(limits));

    ChartData {
        chart_type: settings.chart_type,
        title: settings.title.clone(),
        points,
        total_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use ad_core::data::CellValue;

    fn row(region: &str, sales: f64) -> Row {
        [
            ("Region", Some(CellValue::from(region))),
            ("Sales", Some(CellValue::from(sales))),
        ]
        .into_iter()
        .collect()
    }

    fn settings(chart_type: ChartType) -> ChartSettings {
        ChartSettings {
            chart_type,
            x_axis_column: "Region".into(),
            y_axis_column: "Sales".into(),
            title: "Sales by Region".into(),
        }
    }

    #[test]
    fn test_project_aggregation() {
        let rows = vec![row("East", 10.0), row("West", 7.0), row("East", 5.0)];
        let result = aggregate(&rows, "Region", &["Sales".to_string()]);
        let points = project_aggregation(&result, "Sales");

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name, "East");
        assert_eq!(points[0].value, 15.0);
        assert_eq!(points[0].fields.number("count"), 2.0);

        let counts = project_aggregation(&result, "count");
        assert_eq!(counts[1].value, 1.0);

        let unknown = project_aggregation(&result, "Units");
        assert_eq!(unknown[0].value, 0.0);
    }

    #[test]
    fn test_project_rows_skips_empty_names() {
        let mut rows = vec![row("East", 10.0), row("", 3.0)];
        rows.push([("Sales", Some(CellValue::from("n/a")))].into_iter().collect());
        rows.push([("Region", Some(CellValue::from("North"))), ("Sales", Some(CellValue::from("n/a")))]
            .into_iter()
            .collect());

        let points = project_rows(&rows, "Region", "Sales");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].name, "North");
        assert_eq!(points[1].value, 0.0);
        assert_eq!(points[0].fields.text("Region"), "East");
    }

    #[test]
    fn test_pie_cap_keeps_first_eight() {
        let rows: Vec<Row> = (0..10).map(|i| row(&format!("G{i}"), i as f64)).collect();
        let result = aggregate(&rows, "Region", &["Sales".to_string()]);

        let chart = chart_data(ChartSource::Aggregated(&result), &settings(ChartType::Pie), &DisplayLimits::default());
        assert_eq!(chart.points.len(), 8);
        assert_eq!(chart.total_points, 10);
        assert!(chart.is_truncated());
        assert_eq!(chart.points[7].name, "G7");
    }

    #[test]
    fn test_bar_cap_on_rows() {
        let rows: Vec<Row> = (0..25).map(|i| row("R", i as f64)).collect();
        let chart = chart_data(ChartSource::Rows(&rows), &settings(ChartType::Line), &DisplayLimits::default());
        assert_eq!(chart.points.len(), 20);
        assert_eq!(chart.title, "Sales by Region");
    }
}
