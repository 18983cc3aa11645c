use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{AnalysisSettings, ChartSettings, DisplayLimits, FilterConfig};
use crate::data::Dataset;
use crate::events::{events, EventBus};

/// Identifier of a file in the workspace
pub type FileId = Uuid;

/// Number of leading data rows used for column type inference
pub const DEFAULT_SAMPLE_ROWS: usize = 10;

/// A loaded spreadsheet together with everything the user configured for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFile {
    pub id: FileId,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub dataset: Dataset,
    pub settings: AnalysisSettings,
    pub chart_settings: ChartSettings,

    /// Column -> selected dropdown value
    pub active_filters: IndexMap<String, String>,
    pub search_term: String,
}

impl DataFile {
    /// Wrap a dataset, auto-configuring settings from its columns
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        let settings = AnalysisSettings::auto_configure(&dataset.columns);
        let chart_settings = ChartSettings::auto_configure(&dataset.columns);

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            uploaded_at: Utc::now(),
            dataset,
            settings,
            chart_settings,
            active_filters: IndexMap::new(),
            search_term: String::new(),
        }
    }

    /// Filter configuration in effect: the active dropdown values and search
    /// term, searching over the configured filter columns
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            equality_filters: self.active_filters.clone(),
            search_term: self.search_term.clone(),
            searchable_columns: self.settings.filter_columns.iter().cloned().collect(),
        }
    }

    pub fn set_filter(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.active_filters.insert(column.into(), value.into());
    }

    pub fn clear_filters(&mut self) {
        self.active_filters.clear();
        self.search_term.clear();
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id,
            name: self.name.clone(),
            uploaded_at: self.uploaded_at,
            row_count: self.dataset.row_count(),
            column_count: self.dataset.columns.len(),
        }
    }
}

/// Listing entry for the file manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
}

/// Ingestion progress of one file in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Done,
    Error(String),
}

impl UploadStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, UploadStatus::Uploading)
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Leading rows sampled for type inference
    pub sample_rows: usize,

    /// Chart and table display caps
    pub limits: DisplayLimits,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
            limits: DisplayLimits::default(),
        }
    }
}

/// The workspace: loaded files, the active one, and per-upload status
pub struct AppState {
    /// Loaded files in upload order
    pub files: Arc<RwLock<Vec<DataFile>>>,

    /// Currently selected file
    pub active_file: Arc<RwLock<Option<FileId>>>,

    /// Latest status per upload source (full path, or name for in-memory uploads)
    pub upload_status: Arc<RwLock<IndexMap<String, UploadStatus>>>,

    /// The event bus
    pub event_bus: Arc<EventBus>,

    /// Application settings
    pub settings: Arc<RwLock<AppSettings>>,
}

impl AppState {
    /// Create an empty workspace
    pub fn new() -> Self {
        Self::with_settings(AppSettings::default())
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            files: Arc::new(RwLock::new(Vec::new())),
            active_file: Arc::new(RwLock::new(None)),
            upload_status: Arc::new(RwLock::new(IndexMap::new())),
            event_bus: Arc::new(EventBus::new()),
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Record the status of an upload, publishing the matching event
    pub fn set_upload_status(&self, source: &str, status: UploadStatus) {
        debug!("upload status for {}: {:?}", source, status);
        self.upload_status.write().insert(source.to_string(), status.clone());
        match status {
            UploadStatus::Uploading => self.event_bus.publish(events::FileUploading {
                source: source.to_string(),
            }),
            UploadStatus::Error(error) => self.event_bus.publish(events::FileFailed {
                source: source.to_string(),
                error,
            }),
            UploadStatus::Done => {}
        }
    }

    pub fn upload_status(&self, source: &str) -> Option<UploadStatus> {
        self.upload_status.read().get(source).cloned()
    }

    /// Append a loaded file. The first file becomes active.
    pub fn add_file(&self, file: DataFile) -> FileId {
        let id = file.id;
        let loaded = events::FileLoaded {
            file_id: id,
            file_name: file.name.clone(),
            row_count: file.dataset.row_count(),
            column_count: file.dataset.columns.len(),
        };

        info!(
            "Loaded {} ({} rows, {} columns)",
            loaded.file_name, loaded.row_count, loaded.column_count
        );

        self.files.write().push(file);
        self.event_bus.publish(loaded);

        let became_active = {
            let mut active = self.active_file.write();
            if active.is_none() {
                *active = Some(id);
                true
            } else {
                false
            }
        };
        if became_active {
            self.event_bus.publish(events::ActiveFileChanged { file_id: Some(id) });
        }

        id
    }

    /// Make a file active; unknown ids are ignored
    pub fn select_file(&self, id: FileId) -> bool {
        if !self.files.read().iter().any(|f| f.id == id) {
            return false;
        }
        *self.active_file.write() = Some(id);
        self.event_bus.publish(events::ActiveFileChanged { file_id: Some(id) });
        true
    }

    /// Remove a file. If it was active, the first remaining file takes over.
    pub fn remove_file(&self, id: FileId) -> Option<DataFile> {
        let (removed, next) = {
            let mut files = self.files.write();
            let pos = files.iter().position(|f| f.id == id)?;
            let removed = files.remove(pos);
            (removed, files.first().map(|f| f.id))
        };

        self.event_bus.publish(events::FileRemoved { file_id: id });

        let changed = {
            let mut active = self.active_file.write();
            if *active == Some(id) {
                *active = next;
                true
            } else {
                false
            }
        };
        if changed {
            self.event_bus.publish(events::ActiveFileChanged { file_id: next });
        }

        Some(removed)
    }

    /// Drop every file and upload status
    pub fn clear(&self) {
        self.files.write().clear();
        self.upload_status.write().clear();
        *self.active_file.write() = None;
        self.event_bus.publish(events::ActiveFileChanged { file_id: None });
    }

    pub fn active_file_id(&self) -> Option<FileId> {
        *self.active_file.read()
    }

    /// Run `f` against the active file
    pub fn with_active_file<R>(&self, f: impl FnOnce(&DataFile) -> R) -> Option<R> {
        let id = self.active_file_id()?;
        let files = self.files.read();
        files.iter().find(|file| file.id == id).map(f)
    }

    /// Mutate the active file's configuration
    pub fn update_active_file<R>(&self, f: impl FnOnce(&mut DataFile) -> R) -> Option<R> {
        let id = self.active_file_id()?;
        let result = {
            let mut files = self.files.write();
            files.iter_mut().find(|file| file.id == id).map(f)
        };
        if result.is_some() {
            self.event_bus.publish(events::SettingsChanged { file_id: id });
        }
        result
    }

    pub fn file_summaries(&self) -> Vec<FileSummary> {
        self.files.read().iter().map(DataFile::summary).collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
