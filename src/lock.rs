//! # Single-Instance Guard
//!
//! Two shippers sharing one checkpoint would both read the same value and
//! double-deliver everything after it. When a lock path is configured the
//! process opens that file, takes an exclusive advisory lock on it and records
//! its PID inside for operators.
//!
//! The kernel drops the lock when the holding process exits for any reason, so
//! a file left behind by a killed run never blocks the next start. The PID in
//! the file is informational only.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another shipper (pid {}) holds {}", owner_label(.pid), .path.display())]
    Held { path: PathBuf, pid: Option<u32> },

    #[error("Lock file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Held for the life of the process; dropping it releases the lock
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| lock_io(&path, e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| lock_io(&path, e))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                let pid = read_owner(&mut file);
                return Err(LockError::Held { path, pid });
            }
            Err(TryLockError::Error(e)) => return Err(lock_io(&path, e)),
        }

        if let Some(previous) = read_owner(&mut file) {
            warn!(
                lock_path = %path.display(),
                previous_owner = previous,
                "Previous shipper exited without releasing its lock file"
            );
        }

        write_owner(&mut file).map_err(|e| lock_io(&path, e))?;
        info!(lock_path = %path.display(), pid = std::process::id(), "Acquired instance lock");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Clear the PID first so a leftover file never names a live process.
        if let Err(e) = self.file.set_len(0) {
            warn!(lock_path = %self.path.display(), error = %e, "Failed to clear instance lock file");
        }
        if let Err(e) = self.file.unlock() {
            warn!(lock_path = %self.path.display(), error = %e, "Failed to release instance lock");
        } else {
            debug!(lock_path = %self.path.display(), "Released instance lock");
        }
    }
}

fn read_owner(file: &mut File) -> Option<u32> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

fn write_owner(file: &mut File) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.sync_all()
}

fn owner_label(pid: &Option<u32>) -> String {
    pid.map_or_else(|| "unknown".to_string(), |pid| pid.to_string())
}

fn lock_io(path: &Path, source: io::Error) -> LockError {
    LockError::Io {
        path: path.to_path_buf(),
        source,
    }
}
