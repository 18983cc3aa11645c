use std::io::Cursor;

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, warn};

use ad_core::data::CellValue;
use super::{DataSource, Payload, RawCell, RawSheet};
use crate::DataError;

/// Excel workbook source (.xlsx or .xls); only the first sheet is read
pub struct ExcelSource {
    name: String,
    payload: Payload,
}

impl ExcelSource {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Decode the first worksheet of a workbook held in memory
    pub fn decode(bytes: Vec<u8>) -> Result<RawSheet, DataError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        let sheet_names = workbook.sheet_names().to_owned();
        let Some(first_sheet) = sheet_names.first() else {
            return Err(DataError::Parse("workbook has no sheets".to_string()));
        };

        if sheet_names.len() > 1 {
            debug!("Ignoring {} sheets after '{}'", sheet_names.len() - 1, first_sheet);
        }

        // The range begins at the first used cell; pad back to column A so
        // positions match the sheet
        let range = workbook.worksheet_range(first_sheet)?;
        let leading_columns = range.start().map_or(0, |(_, col)| col as usize);
        let rows = range
            .rows()
            .map(|row| {
                let mut cells: Vec<RawCell> = vec![None; leading_columns];
                cells.extend(row.iter().map(Self::convert_cell));
                cells
            })
            .collect();

        Ok(RawSheet::new(rows))
    }

    fn convert_cell(cell: &Data) -> RawCell {
        match cell {
            Data::Empty => None,
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::Float(v) => Some(CellValue::Number(*v)),
            Data::Int(v) => Some(CellValue::Number(*v as f64)),
            Data::Bool(b) => Some(CellValue::Text(b.to_string())),
            // Dates stay as their serial number
            Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
            Data::Error(e) => {
                warn!("Cell error {:?} imported as text", e);
                Some(CellValue::Text(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl DataSource for ExcelSource {
    async fn read_sheet(&self) -> Result<RawSheet, DataError> {
        let bytes = self.payload.load().await?;
        debug!("Decoding {} ({} bytes) as a workbook", self.name, bytes.len());

        tokio::task::spawn_blocking(move || Self::decode(bytes)).await?
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
