pub mod config_io;
pub mod file_store;
pub mod lock;
pub mod memory_store;
pub mod store;
pub mod watcher;

pub use file_store::FileStore;
pub use memory_store::{MemoryStore, SharedBackend};
pub use store::{StatusChange, StatusStore, StoreError};
