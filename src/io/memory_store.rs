use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

use crate::io::store::{READ_VALUE, StatusChange, StatusStore, StoreError, id_from_key, status_key};

type Inbox = Rc<RefCell<VecDeque<StatusChange>>>;

struct Backend {
    entries: BTreeMap<String, String>,
    available: bool,
    writes: usize,
    inboxes: Vec<Weak<RefCell<VecDeque<StatusChange>>>>,
}

/// In-process key/value storage shared by several [`MemoryStore`] handles.
///
/// Each handle stands for one context (a tab). A write through one handle
/// is delivered to every other open handle as a [`StatusChange`], and only
/// when the stored value actually changes.
#[derive(Clone)]
pub struct SharedBackend(Rc<RefCell<Backend>>);

impl Default for SharedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBackend {
    pub fn new() -> Self {
        SharedBackend(Rc::new(RefCell::new(Backend {
            entries: BTreeMap::new(),
            available: true,
            writes: 0,
            inboxes: Vec::new(),
        })))
    }

    /// Open a new handle on this storage
    pub fn open(&self) -> MemoryStore {
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        let mut backend = self.0.borrow_mut();
        backend.inboxes.retain(|w| w.strong_count() > 0);
        backend.inboxes.push(Rc::downgrade(&inbox));
        MemoryStore {
            backend: self.clone(),
            inbox,
        }
    }

    /// Simulate storage being disabled or full
    pub fn set_available(&self, available: bool) {
        self.0.borrow_mut().available = available;
    }

    /// Number of successful `put` calls across all handles
    pub fn write_count(&self) -> usize {
        self.0.borrow().writes
    }

    /// Raw value for a storage key
    pub fn raw(&self, key: &str) -> Option<String> {
        self.0.borrow().entries.get(key).cloned()
    }

    /// Store an unrelated key, as other scripts sharing the storage would
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.0
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().entries.keys().cloned().collect()
    }
}

/// One context's handle on a [`SharedBackend`]
pub struct MemoryStore {
    backend: SharedBackend,
    inbox: Inbox,
}

impl MemoryStore {
    /// A store with its own private backend
    pub fn new() -> Self {
        SharedBackend::new().open()
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    fn broadcast(&self, backend: &Backend, change: StatusChange) {
        for inbox in backend.inboxes.iter().filter_map(Weak::upgrade) {
            if !Rc::ptr_eq(&inbox, &self.inbox) {
                inbox.borrow_mut().push_back(change.clone());
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore for MemoryStore {
    fn get(&self, id: &str) -> Result<bool, StoreError> {
        let backend = self.backend.0.borrow();
        if !backend.available {
            return Err(StoreError::Unavailable("storage disabled".into()));
        }
        Ok(backend.entries.contains_key(&status_key(id)))
    }

    fn put(&mut self, id: &str, read: bool) -> Result<(), StoreError> {
        let mut backend = self.backend.0.borrow_mut();
        if !backend.available {
            return Err(StoreError::Unavailable("storage disabled".into()));
        }
        backend.writes += 1;
        let key = status_key(id);
        let changed = if read {
            backend.entries.insert(key, READ_VALUE.to_string()).is_none()
        } else {
            backend.entries.remove(&key).is_some()
        };
        if changed {
            self.broadcast(&backend, StatusChange::new(id, read));
        }
        Ok(())
    }

    fn read_ids(&self) -> Result<Vec<String>, StoreError> {
        let backend = self.backend.0.borrow();
        if !backend.available {
            return Err(StoreError::Unavailable("storage disabled".into()));
        }
        Ok(backend
            .entries
            .keys()
            .filter_map(|k| id_from_key(k))
            .map(str::to_string)
            .collect())
    }

    fn poll_external(&mut self) -> Vec<StatusChange> {
        self.inbox.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_presence_only() {
        let mut store = MemoryStore::new();
        store.mark("a").unwrap();
        assert!(store.get("a").unwrap());
        assert_eq!(store.backend().raw("status:a").as_deref(), Some("1"));

        store.clear("a").unwrap();
        assert!(!store.get("a").unwrap());
        assert_eq!(store.backend().raw("status:a"), None);
        assert!(store.backend().keys().is_empty());
    }

    #[test]
    fn writes_reach_other_handles_only() {
        let backend = SharedBackend::new();
        let mut a = backend.open();
        let mut b = backend.open();

        a.mark("x").unwrap();
        assert!(a.poll_external().is_empty());
        assert_eq!(b.poll_external(), vec![StatusChange::new("x", true)]);
        // Drained
        assert!(b.poll_external().is_empty());
        assert!(b.get("x").unwrap());
    }

    #[test]
    fn unchanged_writes_are_not_broadcast() {
        let backend = SharedBackend::new();
        let mut a = backend.open();
        let mut b = backend.open();

        a.clear("x").unwrap();
        a.mark("y").unwrap();
        a.mark("y").unwrap();
        assert_eq!(b.poll_external(), vec![StatusChange::new("y", true)]);
        assert_eq!(backend.write_count(), 3);
    }

    #[test]
    fn dropped_handles_are_pruned() {
        let backend = SharedBackend::new();
        let mut a = backend.open();
        {
            let _b = backend.open();
        }
        a.mark("x").unwrap();
        let c = backend.open();
        assert_eq!(backend.0.borrow().inboxes.len(), 2);
        drop(c);
    }

    #[test]
    fn unavailable_storage_errors() {
        let mut store = MemoryStore::new();
        store.backend().set_available(false);
        assert!(matches!(store.mark("a"), Err(StoreError::Unavailable(_))));
        assert!(store.get("a").is_err());
        store.backend().set_available(true);
        assert!(!store.get("a").unwrap());
    }

    #[test]
    fn read_ids_skips_unrelated_keys() {
        let mut store = MemoryStore::new();
        store.backend().insert_raw("theme", "dark");
        store.mark("b").unwrap();
        store.mark("a").unwrap();
        assert_eq!(store.read_ids().unwrap(), vec!["a", "b"]);
    }
}
