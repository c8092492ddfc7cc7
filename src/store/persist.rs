//! JSON file persistence for conversation threads.
//!
//! Threads are written as pretty JSON under `{data_dir}/threads/`. In-progress
//! placeholder messages are transient and are never written to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::ConversationThread;

use super::StoreError;

/// File holding every persisted thread.
pub fn threads_file(data_dir: &Path) -> PathBuf {
    data_dir.join("threads").join("threads.json")
}

/// Save threads to the data directory.
pub fn save_threads(data_dir: &Path, threads: &[ConversationThread]) -> Result<(), StoreError> {
    let file_path = threads_file(data_dir);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let persistable: Vec<ConversationThread> = threads
        .iter()
        .map(|thread| {
            let mut thread = thread.clone();
            thread.messages.retain(|m| !m.is_pending());
            thread
        })
        .collect();

    let json = serde_json::to_string_pretty(&persistable)?;
    fs::write(&file_path, json)?;
    tracing::debug!(path = %file_path.display(), count = persistable.len(), "threads saved");
    Ok(())
}

/// Load threads from the data directory.
///
/// A missing file is not an error: it yields an empty list.
pub fn load_threads(data_dir: &Path) -> Result<Vec<ConversationThread>, StoreError> {
    let file_path = threads_file(data_dir);
    if !file_path.exists() {
        return Ok(Vec::new());
    }
    let json = fs::read_to_string(&file_path)?;
    let threads = serde_json::from_str(&json)?;
    Ok(threads)
}
