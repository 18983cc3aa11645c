//! Raw cells to the canonical row/column model

use ad_core::data::{Dataset, Row};
use tracing::debug;

use crate::schema::SchemaDetector;
use crate::sources::RawSheet;
use crate::DataError;

/// Message for sheets without a header and at least one data row
pub const EMPTY_FILE_MESSAGE: &str = "File appears to be empty or invalid";

/// Result of normalizing a sheet
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    /// Data rows discarded because every field was null
    pub dropped_rows: usize,
}

/// Turn a decoded sheet into typed columns and canonical rows.
///
/// Row 0 supplies headers. Each data row maps header name to cell, with
/// missing cells as null and cells past the last header ignored. Rows whose
/// fields are all null are dropped.
pub fn normalize(sheet: RawSheet, detector: &SchemaDetector) -> Result<Normalized, DataError> {
    if sheet.row_count() < 2 {
        return Err(DataError::Parse(EMPTY_FILE_MESSAGE.to_string()));
    }

    let mut raw_rows = sheet.rows.into_iter();
    let header_row = raw_rows.next().unwrap_or_default();
    let data_rows: Vec<_> = raw_rows.collect();

    let headers = SchemaDetector::resolve_headers(&header_row);
    let columns = detector.detect_columns(&headers, &data_rows);

    let input_rows = data_rows.len();
    let rows: Vec<Row> = data_rows
        .into_iter()
        .map(|raw| {
            let mut cells = raw.into_iter();
            let mut row = Row::with_capacity(headers.len());
            for header in &headers {
                row.insert(header.clone(), cells.next().flatten());
            }
            row
        })
        .filter(|row| !row.is_all_null())
        .collect();

    let dropped_rows = input_rows - rows.len();
    debug!(
        "Normalized {} rows x {} columns ({} empty rows dropped)",
        rows.len(),
        columns.len(),
        dropped_rows
    );

    Ok(Normalized {
        dataset: Dataset::new(columns, rows),
        dropped_rows,
    })
}
