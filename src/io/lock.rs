use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::model::board::LOCK_FILE;

/// Advisory lock over `<board>/.lock`.
///
/// Uses flock (Unix) so cooperating CLI and TUI processes serialize
/// activity-log appends and consistency passes. Released on drop.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another kanban process may be writing")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Acquire the board lock, blocking up to `timeout`.
    pub fn acquire(board_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = board_dir.join(LOCK_FILE);
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
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    return Ok(FileLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    return Err(LockError::Timeout { path: lock_path });
                }
            }
        }
    }

    /// Acquire with the default timeout (5 seconds)
    pub fn acquire_default(board_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(board_dir, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The lock file itself stays on disk: unlinking a locked file would let a
// second process lock a fresh inode under the same name.

/// Try to acquire an exclusive flock on the file (non-blocking)
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
    // Advisory only; other platforms run unlocked
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_and_release() {
        let tmp = TempDir::new().unwrap();
        let lock = FileLock::acquire_default(tmp.path());
        assert!(lock.is_ok());
        drop(lock);
        let again = FileLock::acquire_default(tmp.path());
        assert!(again.is_ok());
        assert!(tmp.path().join(".lock").exists());
    }

    #[cfg(unix)]
    #[test]
    fn contention_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = FileLock::acquire_default(tmp.path()).unwrap();
        let second = FileLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }
}
