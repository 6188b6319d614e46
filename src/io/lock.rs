use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a writer waits for another process to finish its write.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock held while a status file is read, patched and rewritten.
///
/// Uses flock (Unix) so that several readmark processes sharing one status
/// file never interleave their read-modify-write cycles.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: another readmark process is writing")]
    Timeout { path: PathBuf },
}

impl StoreLock {
    /// Path of the lock file guarding `store_path`
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        store_path.with_file_name(name)
    }

    /// Lock `store_path`, waiting up to `timeout`.
    pub fn acquire(store_path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = Self::lock_path(store_path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout { path: lock_path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(StoreLock {
            _file: file,
            path: lock_path,
        })
    }

    pub fn acquire_default(store_path: &Path) -> Result<Self, LockError> {
        Self::acquire(store_path, DEFAULT_TIMEOUT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The lock file stays on disk. Unlinking it while another process waits
// on it breaks mutual exclusion.

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_sits_next_to_store() {
        let p = StoreLock::lock_path(Path::new("/tmp/x/status.json"));
        assert_eq!(p, PathBuf::from("/tmp/x/status.json.lock"));
    }

    #[test]
    fn acquire_and_release() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("status.json");

        let lock = StoreLock::acquire_default(&store).unwrap();
        assert!(lock.path().exists());
        drop(lock);

        assert!(StoreLock::acquire_default(&store).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn contention_times_out() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("status.json");

        let _held = StoreLock::acquire_default(&store).unwrap();
        let second = StoreLock::acquire(&store, Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }
}
