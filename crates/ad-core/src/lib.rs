//! Core functionality for the analysis engine
//!
//! This crate provides the canonical data model, the per-file configuration,
//! and the workspace state shared by ingestion and the pipeline.

pub mod config;
pub mod data;
pub mod events;
pub mod presets;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use config::{AnalysisSettings, ChartSettings, ChartType, DisplayLimits, FilterConfig};
pub use data::{CellValue, Column, ColumnType, Dataset, DatasetId, Row};
pub use events::EventBus;
pub use presets::{FilterPreset, PresetId, PresetManager};
pub use state::{AppSettings, AppState, DataFile, FileId, FileSummary, UploadStatus};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
