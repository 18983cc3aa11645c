pub mod csv_source;
pub mod excel_source;

pub use csv_source::CsvSource;
pub use excel_source::ExcelSource;

use std::path::{Path, PathBuf};

use ad_core::data::CellValue;
use async_trait::async_trait;

use crate::DataError;

/// Message shown when a file has an extension we cannot read
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Please upload an Excel file (.xlsx, .xls) or CSV file";

/// One decoded cell; `None` is an empty or missing cell
pub type RawCell = Option<CellValue>;

/// The first sheet of a file as a grid of untyped cells. Row 0 holds headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Accepted spreadsheet formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// Classify a file by its (case-insensitive) extension
    pub fn from_file_name(name: &str) -> Result<Self, DataError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("xlsx") => Ok(SourceFormat::Xlsx),
            Some("xls") => Ok(SourceFormat::Xls),
            _ => Err(DataError::UnsupportedFormat(UNSUPPORTED_FORMAT_MESSAGE.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
        }
    }
}

/// Where the bytes of a file come from
#[derive(Debug, Clone)]
pub enum Payload {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl Payload {
    /// Fetch the raw bytes
    pub async fn load(&self) -> Result<Vec<u8>, DataError> {
        match self {
            Payload::Path(path) => Ok(tokio::fs::read(path).await?),
            Payload::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// A readable spreadsheet
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Decode the first sheet into raw cells
    async fn read_sheet(&self) -> Result<RawSheet, DataError>;

    /// Get the source name
    fn source_name(&self) -> &str;
}

/// Build the source matching the file name's extension
pub fn open_source(name: impl Into<String>, payload: Payload) -> Result<Box<dyn DataSource>, DataError> {
    let name = name.into();
    match SourceFormat::from_file_name(&name)? {
        SourceFormat::Csv => Ok(Box::new(CsvSource::new(name, payload))),
        SourceFormat::Xlsx | SourceFormat::Xls => Ok(Box::new(ExcelSource::new(name, payload))),
    }
}
