//! # Lock Security
//!
//! - **Timeout Protection**: acquisition gives up after a bounded wait
//! - **Stale Detection**: a lock whose recorded PID is gone is reclaimed

use std::path::Path;
use std::time::Duration;

/// Default wait for a contended lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest pause between two acquisition attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Checks if a process with the given PID is still running.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // /proc is Linux-specific; elsewhere assume the holder is alive
        let proc_root = Path::new("/proc");
        if proc_root.is_dir() {
            return proc_root.join(pid.to_string()).exists();
        }
        true
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

/// Validates that a lock file path is within the data directory.
pub fn validate_lock_path(data_dir: &Path, lock_path: &Path) -> bool {
    lock_path
        .canonicalize()
        .ok()
        .and_then(|canonical| {
            data_dir
                .canonicalize()
                .ok()
                .map(|data_canonical| canonical.starts_with(&data_canonical))
        })
        .unwrap_or(false)
}
