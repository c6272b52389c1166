//! Index persistence.
//!
//! The index is one JSON document (`{ "meta": ..., "records": [...] }`).
//! It is never edited in place: every write serializes a complete new index
//! to a sibling temp file, syncs it, and renames it over the old one, so a
//! reader sees either the previous or the next version and nothing between.
//!
//! Writers in one process are serialized through [`write_lock`].

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::models::Index;

/// Reads the index at `path`. A missing file is an empty index.
pub fn load_index(path: &Path) -> Result<Index> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Index::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read index: {}", path.display()))
        }
    };
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse index: {}", path.display()))
}

/// Atomically replaces the index at `path` with `index`.
pub fn persist_index(path: &Path, index: &Index) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create index directory: {}", parent.display()))?;
    }

    let tmp_path = temp_path(path);
    let payload = serde_json::to_vec(index).context("Failed to serialize index")?;
    let result = write_synced(&tmp_path, &payload).and_then(|()| {
        std::fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move {} into place at {}",
                tmp_path.display(),
                path.display()
            )
        })
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn write_synced(path: &Path, payload: &[u8]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(payload)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync {}", path.display()))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("index"));
    name.push(".tmp");
    path.with_file_name(name)
}

type LockMap = Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>;

/// The writer lock for the index at `path`, shared by every caller in this
/// process that names the same file.
pub fn write_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<LockMap> = OnceLock::new();
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(key).or_default().clone()
}
