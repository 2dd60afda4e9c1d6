//! # File Lock Implementation
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use crate::adapters::storage::record::LOCK_FILE_NAME;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

use super::security::{is_process_running, validate_lock_path, MAX_RETRY_DELAY};

/// Errors from data-directory locking.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock file could not be created or opened.
    #[error("failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),

    /// Another process holds the lock.
    #[error("data directory already in use{} ({})", holder(.pid), .path.display())]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    /// Failed to write our PID into the lock file.
    #[error("failed to write PID to lock file: {0}")]
    WriteFailed(#[source] io::Error),
}

fn holder(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" by process {}", p)).unwrap_or_default()
}

/// Exclusive lock on a data directory.
///
/// Acquired on node startup, released on drop.
///
/// # Example
///
/// ```ignore
/// let lock = DataDirLock::acquire(Path::new("./data"))?;
/// // Lock is held until `lock` goes out of scope
/// ```
#[derive(Debug)]
pub struct DataDirLock {
    /// Kept open to maintain the lock.
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DataDirLock {
    /// Acquire the lock, waiting up to `DEFAULT_LOCK_TIMEOUT`.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_with_timeout(data_dir, super::DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire the lock, retrying with exponential backoff until `timeout`.
    ///
    /// A lock file left by a process that is no longer running is reclaimed.
    ///
    /// # Errors
    ///
    /// `LockError::AlreadyLocked` if another process still holds the lock
    /// when the timeout expires.
    pub fn acquire_with_timeout(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        let lock_path = data_dir.join(LOCK_FILE_NAME);
        let mut retry_delay = Duration::from_millis(50);

        loop {
            if lock_path.exists() && !validate_lock_path(data_dir, &lock_path) {
                return Err(LockError::CreateFailed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "lock path escapes data directory",
                )));
            }

            // not truncated here: the holder's PID must stay readable
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)
                .map_err(LockError::CreateFailed)?;

            if file.try_lock_exclusive().is_ok() {
                // the previous holder unlinks the file before unlocking it
                if !is_linked_at(&file, &lock_path) {
                    drop(file);
                    continue;
                }
                return Self::claim(file, lock_path);
            }
            drop(file);

            if Instant::now() >= deadline {
                return Err(LockError::AlreadyLocked {
                    pid: Self::read_existing_pid(&lock_path),
                    path: lock_path,
                });
            }

            std::thread::sleep(retry_delay);
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
    }

    /// Record our PID in a file we hold the lock on.
    ///
    /// A PID left by a process that died without cleaning up is only
    /// overwritten here, under the lock.
    fn claim(mut file: File, path: PathBuf) -> Result<Self, LockError> {
        let pid = std::process::id();

        let mut previous = String::new();
        if file.read_to_string(&mut previous).is_ok() {
            if let Ok(stale) = previous.trim().parse::<u32>() {
                if stale != pid && !is_process_running(stale) {
                    warn!(pid = stale, path = %path.display(), "[ipam] Reclaiming stale lock");
                }
            }
        }

        file.set_len(0).map_err(LockError::WriteFailed)?;
        file.seek(SeekFrom::Start(0))
            .map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", pid).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        info!(path = %path.display(), pid, "[ipam] Data directory locked");
        Ok(Self { file, path, pid })
    }

    /// PID of the process holding the lock.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

/// True when `path` still names the file behind `file`.
#[cfg(unix)]
pub(super) fn is_linked_at(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(named)) => held.dev() == named.dev() && held.ino() == named.ino(),
        _ => false,
    }
}

// an open file cannot be deleted on Windows
#[cfg(not(unix))]
pub(super) fn is_linked_at(_file: &File, _path: &Path) -> bool {
    true
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        // waiters that locked the unlinked file see it is gone and retry
        let _ = fs::remove_file(&self.path);
        #[allow(clippy::incompatible_msrv)]
        let _ = self.file.unlock();
    }
}
