//! Data ingestion: decoding spreadsheets and normalizing them into datasets

pub mod cache;
pub mod ingest;
pub mod normalize;
pub mod schema;
pub mod sources;

use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use cache::DataCache;
pub use ingest::{ingest_batch, ingest_bytes, ingest_path, UploadOutcome};
pub use normalize::{normalize, Normalized};
pub use schema::SchemaDetector;
pub use sources::{CsvSource, DataSource, ExcelSource, RawSheet, SourceFormat};

/// Errors that can occur while ingesting a file
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Read(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Parse(error.to_string()),
        }
    }
}

impl From<calamine::Error> for DataError {
    fn from(error: calamine::Error) -> Self {
        DataError::Parse(error.to_string())
    }
}
