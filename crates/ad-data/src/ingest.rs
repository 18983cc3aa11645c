//! File ingestion into the workspace
//!
//! Every file in a batch is read, decoded and normalized by its own task.
//! A file's status moves from "uploading" to "done" or "error" on its own
//! schedule, and only a successfully normalized file is appended to the
//! shared collection. A failure never affects sibling files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ad_core::state::{AppState, DataFile, FileId, UploadStatus};
use tracing::{info, warn};

use crate::normalize::normalize;
use crate::schema::SchemaDetector;
use crate::sources::{open_source, Payload};
use crate::DataError;

/// Final result for one uploaded file
#[derive(Debug)]
pub struct UploadOutcome {
    /// Upload status key: the full path, or the name of an in-memory upload
    pub source: String,
    pub file_name: String,
    pub result: Result<FileId, DataError>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ingest a file from disk
pub async fn ingest_path(state: Arc<AppState>, path: PathBuf) -> UploadOutcome {
    let source = path.display().to_string();
    let file_name = display_name(&path);
    ingest(state, source, file_name, Payload::Path(path)).await
}

/// Ingest an uploaded payload already held in memory
pub async fn ingest_bytes(state: Arc<AppState>, file_name: impl Into<String>, bytes: Vec<u8>) -> UploadOutcome {
    let file_name = file_name.into();
    ingest(state, file_name.clone(), file_name, Payload::Bytes(bytes)).await
}

/// Ingest several files concurrently. Outcomes come back in input order.
pub async fn ingest_batch(state: &Arc<AppState>, paths: Vec<PathBuf>) -> Vec<UploadOutcome> {
    info!("Ingesting batch of {} files", paths.len());

    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let source = path.display().to_string();
            let file_name = display_name(&path);
            (source, file_name, tokio::spawn(ingest_path(state.clone(), path)))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (source, file_name, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(join_error) => {
                let error = DataError::from(join_error);
                state.set_upload_status(&source, UploadStatus::Error(error.to_string()));
                outcomes.push(UploadOutcome {
                    source,
                    file_name,
                    result: Err(error),
                });
            }
        }
    }

    let loaded = outcomes.iter().filter(|o| o.is_success()).count();
    info!("Batch finished: {} loaded, {} failed", loaded, outcomes.len() - loaded);
    outcomes
}

async fn ingest(state: Arc<AppState>, source: String, file_name: String, payload: Payload) -> UploadOutcome {
    let result = load(&state, &source, &file_name, payload).await;

    match &result {
        Ok(_) => state.set_upload_status(&source, UploadStatus::Done),
        Err(error) => {
            warn!("Failed to ingest {}: {}", source, error);
            state.set_upload_status(&source, UploadStatus::Error(error.to_string()));
        }
    }

    UploadOutcome {
        source,
        file_name,
        result,
    }
}

async fn load(state: &AppState, source: &str, file_name: &str, payload: Payload) -> Result<FileId, DataError> {
    let data_source = open_source(file_name, payload)?;
    state.set_upload_status(source, UploadStatus::Uploading);

    let sheet = data_source.read_sheet().await?;
    let sample_rows = state.settings.read().sample_rows;
    let normalized = normalize(sheet, &SchemaDetector::new().with_sample_size(sample_rows))?;

    Ok(state.add_file(DataFile::new(file_name, normalized.dataset)))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("sales.csv");
        let empty = dir.path().join("empty.csv");
        let other = dir.path().join("notes.txt");
        fs::write(&good, "Region,Sales\nEast,10\nWest,7\n").unwrap();
        fs::write(&empty, "Region,Sales\n").unwrap();
        fs::write(&other, "hello").unwrap();

        let good_key = good.display().to_string();
        let other_key = other.display().to_string();

        let state = Arc::new(AppState::new());
        let outcomes = ingest_batch(
            &state,
            vec![good, empty, other, dir.path().join("missing.csv")],
        )
        .await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_success());
        assert!(matches!(outcomes[1].result, Err(DataError::Parse(_))));
        assert!(matches!(outcomes[2].result, Err(DataError::UnsupportedFormat(_))));
        assert!(matches!(outcomes[3].result, Err(DataError::Read(_))));

        assert_eq!(state.file_count(), 1);
        assert_eq!(outcomes[0].source, good_key);
        assert_eq!(outcomes[0].file_name, "sales.csv");
        assert_eq!(state.upload_status(&good_key), Some(UploadStatus::Done));
        assert!(matches!(state.upload_status(&other_key), Some(UploadStatus::Error(_))));
        assert_eq!(state.upload_status("sales.csv"), None);
        assert_eq!(
            state.with_active_file(|f| f.dataset.row_count()),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_same_name_in_two_folders_keeps_separate_status() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = dir.path().join("a").join("data.csv");
        let second = dir.path().join("b").join("data.csv");
        fs::write(&first, "Region,Sales\nEast,10\n").unwrap();
        fs::write(&second, "Region,Sales\n").unwrap();

        let state = Arc::new(AppState::new());
        let outcomes = ingest_batch(&state, vec![first.clone(), second.clone()]).await;

        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert_eq!(outcomes[0].file_name, outcomes[1].file_name);
        assert_eq!(
            state.upload_status(&first.display().to_string()),
            Some(UploadStatus::Done)
        );
        assert!(matches!(
            state.upload_status(&second.display().to_string()),
            Some(UploadStatus::Error(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_publishes_progress_per_file() {
        use ad_core::events::events::{FileFailed, FileLoaded, FileUploading};
        use parking_lot::Mutex;

        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("sales.csv");
        let empty = dir.path().join("empty.csv");
        let other = dir.path().join("notes.txt");
        fs::write(&good, "Region,Sales\nEast,10\nWest,7\n").unwrap();
        fs::write(&empty, "Region,Sales\n").unwrap();
        fs::write(&other, "hello").unwrap();

        let state = Arc::new(AppState::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            state
                .event_bus
                .on(move |e: &FileUploading| seen.lock().push(format!("uploading {}", e.source)));
        }
        {
            let seen = seen.clone();
            state.event_bus.on(move |e: &FileLoaded| {
                seen.lock().push(format!("loaded {} {}x{}", e.file_name, e.row_count, e.column_count))
            });
        }
        {
            let seen = seen.clone();
            state
                .event_bus
                .on(move |e: &FileFailed| seen.lock().push(format!("failed {}", e.source)));
        }

        let keys: Vec<String> = [&good, &empty, &other].iter().map(|p| p.display().to_string()).collect();
        ingest_batch(&state, vec![good, empty, other]).await;

        let seen = seen.lock().clone();
        let position = |line: &str| seen.iter().position(|s| s == line);

        // files finish in any order, but each one starts before it resolves
        let good_start = position(&format!("uploading {}", keys[0])).unwrap();
        let good_end = position("loaded sales.csv 2x2").unwrap();
        assert!(good_start < good_end);

        let empty_start = position(&format!("uploading {}", keys[1])).unwrap();
        let empty_end = position(&format!("failed {}", keys[1])).unwrap();
        assert!(empty_start < empty_end);

        // an unsupported format is rejected before reading starts
        assert_eq!(position(&format!("uploading {}", keys[2])), None);
        assert!(position(&format!("failed {}", keys[2])).is_some());
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_ingest_bytes() {
        let state = Arc::new(AppState::new());
        let outcome = ingest_bytes(state.clone(), "upload.csv", b"a,b\n1,x\n".to_vec()).await;

        let id = outcome.result.unwrap();
        assert_eq!(state.active_file_id(), Some(id));
        assert_eq!(
            state.with_active_file(|f| f.settings.group_by_column.clone()),
            Some("b".to_string())
        );
    }
}
