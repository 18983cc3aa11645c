use async_trait::async_trait;
use csv::ReaderBuilder;
use tracing::debug;

use ad_core::data::{format_number, CellValue};
use super::{DataSource, Payload, RawCell, RawSheet};
use crate::DataError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV data source
pub struct CsvSource {
    /// File name as uploaded
    name: String,
    /// Where the bytes live
    payload: Payload,
}

impl CsvSource {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Decode CSV bytes into a raw grid.
    ///
    /// Records may have differing lengths. Empty fields become missing cells.
    /// A field becomes a numeric cell only when it is exactly how that number
    /// renders, so `10` and `2.5` are numbers while `007`, `1.50` and ` 7`
    /// keep their spelling as text. Inference and sums still read those
    /// numerically.
    pub fn decode(bytes: &[u8]) -> Result<RawSheet, DataError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(Self::parse_field).collect::<Vec<_>>());
        }

        Ok(RawSheet::new(rows))
    }

    fn parse_field(field: &str) -> RawCell {
        if field.is_empty() {
            return None;
        }
        match field.parse::<f64>() {
            Ok(v) if v.is_finite() && format_number(v) == field => Some(CellValue::Number(v)),
            _ => Some(CellValue::Text(field.to_string())),
        }
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn read_sheet(&self) -> Result<RawSheet, DataError> {
        let bytes = self.payload.load().await?;
        debug!("Decoding {} ({} bytes) as CSV", self.name, bytes.len());

        tokio::task::spawn_blocking(move || Self::decode(&bytes)).await?
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
