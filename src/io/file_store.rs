use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::io::lock::StoreLock;
use crate::io::store::{READ_VALUE, StatusChange, StatusStore, StoreError, id_from_key, status_key};
use crate::io::watcher::StoreWatcher;

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Status store backed by a JSON object file: `{"status:<id>": "1", ...}`.
///
/// Every write re-reads the file under a [`StoreLock`], patches only the
/// keys being changed and rewrites it atomically, so other processes'
/// entries and unrelated keys survive. Changes other processes made are
/// reported by [`StatusStore::poll_external`], either on every poll or,
/// after [`FileStore::watch`], only when the watcher saw the file change.
pub struct FileStore {
    path: PathBuf,
    /// Read ids as of the last time this handle looked at the file
    known: BTreeSet<String>,
    /// External changes found while writing, not yet handed out
    pending: Vec<StatusChange>,
    watcher: Option<StoreWatcher>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let doc = read_document(path)?;
        Ok(FileStore {
            path: path.to_path_buf(),
            known: read_set(&doc),
            pending: Vec::new(),
            watcher: None,
        })
    }

    /// Only reload on poll when a filesystem event says the file changed.
    pub fn watch(mut self) -> Result<Self, StoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| StoreError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        let watcher = StoreWatcher::start(&self.path).map_err(|e| {
            StoreError::Unavailable(format!("cannot watch {}: {}", self.path.display(), e))
        })?;
        self.watcher = Some(watcher);
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the known set with `fresh`, queueing what changed.
    fn absorb(&mut self, fresh: BTreeSet<String>) {
        let changes = diff(&self.known, &fresh);
        if !changes.is_empty() {
            debug!(count = changes.len(), path = %self.path.display(), "external status changes");
        }
        self.pending.extend(changes);
        self.known = fresh;
    }
}

impl StatusStore for FileStore {
    fn get(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.known.contains(id))
    }

    fn put(&mut self, id: &str, read: bool) -> Result<(), StoreError> {
        self.write_batch(&[StatusChange::new(id, read)])
    }

    fn write_batch(&mut self, changes: &[StatusChange]) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| StoreError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let _lock = StoreLock::acquire_default(&self.path)?;
        let mut doc = read_document(&self.path)?;
        self.absorb(read_set(&doc));

        for change in changes {
            let key = status_key(&change.id);
            if change.value {
                doc.insert(key, Value::String(READ_VALUE.to_string()));
            } else {
                doc.remove(&key);
            }
        }

        let content = serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        self.known = read_set(&doc);
        Ok(())
    }

    fn read_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.known.iter().cloned().collect())
    }

    fn poll_external(&mut self) -> Vec<StatusChange> {
        let reload = match &self.watcher {
            Some(w) => w.poll(),
            None => true,
        };
        if reload {
            match read_document(&self.path) {
                Ok(doc) => self.absorb(read_set(&doc)),
                Err(e) => warn!(error = %e, "could not reload status file"),
            }
        }
        std::mem::take(&mut self.pending)
    }
}

fn read_document(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ids whose key is present. Presence is what counts, not the value.
fn read_set(doc: &Map<String, Value>) -> BTreeSet<String> {
    doc.keys()
        .filter_map(|k| id_from_key(k))
        .map(str::to_string)
        .collect()
}

fn diff(old: &BTreeSet<String>, new: &BTreeSet<String>) -> Vec<StatusChange> {
    let added = new.difference(old).map(|id| StatusChange::new(id.clone(), true));
    let removed = old
        .difference(new)
        .map(|id| StatusChange::new(id.clone(), false));
    added.chain(removed).collect()
}
