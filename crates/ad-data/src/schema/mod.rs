use ad_core::data::{CellValue, Column, ColumnType};
use ad_core::state::DEFAULT_SAMPLE_ROWS;

use crate::sources::RawCell;

/// Schema detector for analyzing raw cells and determining column types
pub struct SchemaDetector {
    sample_size: usize,
}

impl SchemaDetector {
    /// Create a new schema detector
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_ROWS,
        }
    }

    /// Set the number of leading data rows inspected per column
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Resolve header names; empty headers become `Column {n}` (1-based)
    pub fn resolve_headers(header_row: &[RawCell]) -> Vec<String> {
        header_row
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Some(value) if !value.is_empty_text() => value.to_string(),
                _ => format!("Column {}", idx + 1),
            })
            .collect()
    }

    /// Infer one column per header from the leading data rows
    pub fn detect_columns(&self, headers: &[String], data_rows: &[Vec<RawCell>]) -> Vec<Column> {
        let samples = &data_rows[..data_rows.len().min(self.sample_size)];

        headers
            .iter()
            .enumerate()
            .map(|(col_idx, header)| Column::new(header.clone(), Self::analyze_column(samples, col_idx)))
            .collect()
    }

    /// A column is numeric when every sampled cell is missing, blank, or a
    /// finite number
    fn analyze_column(samples: &[Vec<RawCell>], col_idx: usize) -> ColumnType {
        let is_number = samples.iter().all(|row| match row.get(col_idx) {
            None | Some(None) => true,
            Some(Some(value)) => value.is_blank() || Self::is_numeric(value),
        });

        if is_number {
            ColumnType::Number
        } else {
            ColumnType::Text
        }
    }

    fn is_numeric(value: &CellValue) -> bool {
        value.as_number().is_some()
    }
}

impl Default for SchemaDetector {
    fn default() -> Self {
        Self::new()
    }
}
