//! Per-file analysis configuration

use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::data::{Column, ColumnType};

/// Maximum points handed to bar and line charts
pub const DEFAULT_CHART_POINTS: usize = 20;

/// Maximum slices handed to pie charts
pub const DEFAULT_PIE_POINTS: usize = 8;

/// Maximum rows shown in the table preview
pub const DEFAULT_TABLE_ROWS: usize = 100;

/// Display caps applied after all computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayLimits {
    pub chart_points: usize,
    pub pie_points: usize,
    pub table_rows: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            chart_points: DEFAULT_CHART_POINTS,
            pie_points: DEFAULT_PIE_POINTS,
            table_rows: DEFAULT_TABLE_ROWS,
        }
    }
}

/// Which columns filter, group, sum and display
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Columns offering value filters and taking part in free-text search
    pub filter_columns: Vec<String>,

    /// Aggregation key; empty disables aggregation
    pub group_by_column: String,

    /// Numeric columns totalled per group
    pub sum_columns: Vec<String>,

    /// Columns rendered in the table and export; empty means all
    pub display_columns: Vec<String>,

    /// Whether the table and chart show groups instead of raw rows
    #[serde(default = "default_true")]
    pub show_aggregated: bool,
}

fn default_true() -> bool {
    true
}

impl AnalysisSettings {
    /// Derive sensible defaults from freshly inferred columns
    pub fn auto_configure(columns: &[Column]) -> Self {
        let text = names_of(columns, ColumnType::Text);
        let numbers = names_of(columns, ColumnType::Number);

        Self {
            filter_columns: text.iter().take(2).cloned().collect(),
            group_by_column: text.first().cloned().unwrap_or_default(),
            sum_columns: numbers.iter().take(1).cloned().collect(),
            display_columns: columns.iter().map(|c| c.name.clone()).collect(),
            show_aggregated: true,
        }
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_by_column.is_empty()
    }

    /// Aggregated output replaces raw rows in the table, chart and export
    pub fn aggregation_active(&self) -> bool {
        self.show_aggregated && self.is_grouped()
    }

    /// Display columns, or every column name when none are selected
    pub fn resolved_display_columns(&self, columns: &[Column]) -> Vec<String> {
        if self.display_columns.is_empty() {
            columns.iter().map(|c| c.name.clone()).collect()
        } else {
            self.display_columns.clone()
        }
    }

    pub fn toggle_filter_column(&mut self, column: &str) {
        toggle(&mut self.filter_columns, column);
    }

    pub fn toggle_sum_column(&mut self, column: &str) {
        toggle(&mut self.sum_columns, column);
    }

    pub fn toggle_display_column(&mut self, column: &str) {
        toggle(&mut self.display_columns, column);
    }
}

fn names_of(columns: &[Column], column_type: ColumnType) -> Vec<String> {
    columns
        .iter()
        .filter(|c| c.column_type == column_type)
        .map(|c| c.name.clone())
        .collect()
}

fn toggle(list: &mut Vec<String>, column: &str) {
    if let Some(pos) = list.iter().position(|c| c == column) {
        list.remove(pos);
    } else {
        list.push(column.to_string());
    }
}

/// Chart rendering style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    #[default]
    Bar,
    Pie,
    Line,
}

impl ChartType {
    /// Parse a chart type name. Unknown names fall back to a bar chart.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pie" => ChartType::Pie,
            "line" => ChartType::Line,
            _ => ChartType::Bar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Line => "line",
        }
    }

    /// Number of points this chart type renders
    pub fn display_cap(&self, limits: &DisplayLimits) -> usize {
        match self {
            ChartType::Bar | ChartType::Line => limits.chart_points,
            ChartType::Pie => limits.pie_points,
        }
    }
}

impl From<String> for ChartType {
    fn from(name: String) -> Self {
        ChartType::parse_lenient(&name)
    }
}

impl From<ChartType> for String {
    fn from(chart_type: ChartType) -> Self {
        chart_type.as_str().to_string()
    }
}

/// Chart configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartSettings {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub x_axis_column: String,
    pub y_axis_column: String,
    pub title: String,
}

impl ChartSettings {
    pub fn auto_configure(columns: &[Column]) -> Self {
        let text = names_of(columns, ColumnType::Text);
        let numbers = names_of(columns, ColumnType::Number);
        let x = text.first().cloned().unwrap_or_default();
        let y = numbers.first().cloned().unwrap_or_default();

        Self {
            chart_type: ChartType::Bar,
            title: format!(
                "{} by {}",
                if y.is_empty() { "Value" } else { &y },
                if x.is_empty() { "Category" } else { &x },
            ),
            x_axis_column: x,
            y_axis_column: y,
        }
    }

    /// Both axes must be chosen before anything is plotted
    pub fn is_complete(&self) -> bool {
        !self.x_axis_column.is_empty() && !self.y_axis_column.is_empty()
    }
}

/// Row selection: per-column equality filters plus a free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Column -> selected value; empty values impose no constraint
    pub equality_filters: IndexMap<String, String>,

    pub search_term: String,

    /// Only these columns are scanned by the search term
    pub searchable_columns: IndexSet<String>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.equality_filters.insert(column.into(), value.into());
        self
    }

    pub fn with_search(
        mut self,
        term: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.search_term = term.into();
        self.searchable_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// True when no filter or search would exclude anything
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.equality_filters.values().all(String::is_empty)
    }
}

impl Hash for FilterConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.equality_filters.len().hash(state);
        for (column, value) in &self.equality_filters {
            column.hash(state);
            value.hash(state);
        }
        self.search_term.hash(state);
        self.searchable_columns.len().hash(state);
        for column in &self.searchable_columns {
            column.hash(state);
        }
    }
}
