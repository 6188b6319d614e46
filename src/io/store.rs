use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::io::lock::LockError;

/// Prefix of every persisted status key
pub const KEY_PREFIX: &str = "status:";

/// Value stored for a read item. Unread items have no key at all.
pub const READ_VALUE: &str = "1";

/// Storage key for an item id
pub fn status_key(id: &str) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

/// Item id for a storage key, if the key is a status key
pub fn id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(KEY_PREFIX).filter(|id| !id.is_empty())
}

/// A status mutation, either requested locally or observed from another
/// context sharing the same store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: String,
    pub value: bool,
}

impl StatusChange {
    pub fn new(id: impl Into<String>, value: bool) -> Self {
        StatusChange {
            id: id.into(),
            value,
        }
    }
}

/// Error type for status store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("status store unavailable: {0}")]
    Unavailable(String),
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("status file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Durable id → read flag mapping with presence-only persistence.
///
/// `poll_external` returns changes written by other contexts since the
/// last poll; a handle never sees its own writes there.
pub trait StatusStore {
    fn get(&self, id: &str) -> Result<bool, StoreError>;

    /// Persist `read`: store the key when true, remove it when false.
    fn put(&mut self, id: &str, read: bool) -> Result<(), StoreError>;

    fn mark(&mut self, id: &str) -> Result<(), StoreError> {
        self.put(id, true)
    }

    fn clear(&mut self, id: &str) -> Result<(), StoreError> {
        self.put(id, false)
    }

    /// Persist several changes. Backends with expensive writes override this.
    fn write_batch(&mut self, changes: &[StatusChange]) -> Result<(), StoreError> {
        for change in changes {
            self.put(&change.id, change.value)?;
        }
        Ok(())
    }

    /// Ids currently persisted as read
    fn read_ids(&self) -> Result<Vec<String>, StoreError>;

    fn poll_external(&mut self) -> Vec<StatusChange>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip() {
        assert_eq!(status_key("hist-plato"), "status:hist-plato");
        assert_eq!(id_from_key("status:hist-plato"), Some("hist-plato"));
        assert_eq!(id_from_key("status:"), None);
        assert_eq!(id_from_key("theme"), None);
    }
}
