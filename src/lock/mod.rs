//! Single-instance guard backed by a pid file.
//!
//! The lock file holds the bare process identifier of the holder. A record
//! naming a process that is no longer running is stale and may be reclaimed.
mod process_table;

#[cfg(test)]
mod tests;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::LockError;

pub use process_table::{OsProcessTable, ProcessTable};

/// Proof that the caller holds the lock. Consumed by [`LockManager::release`].
#[derive(Debug)]
#[must_use = "the lock must be released on every terminal path"]
pub struct LockToken {
    path: PathBuf,
    pid: u32,
}

impl LockToken {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }
}

pub struct LockManager {
    path: PathBuf,
    pid: u32,
    processes: Box<dyn ProcessTable>,
}

impl LockManager {
    /// Lock manager for the current process.
    #[must_use]
    pub fn new(path: PathBuf, processes: Box<dyn ProcessTable>) -> Self {
        Self::with_pid(path, std::process::id(), processes)
    }

    #[must_use]
    pub fn with_pid(path: PathBuf, pid: u32, processes: Box<dyn ProcessTable>) -> Self {
        Self {
            path,
            pid,
            processes,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the lock unless a live process already holds it.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Busy`] when the recorded pid is running, or an I/O
    /// variant when the lock file cannot be read or written.
    pub fn try_acquire(&self) -> Result<LockToken, LockError> {
        let reclaim = match read_holder(&self.path)? {
            Some(holder) if self.processes.is_running(holder) => {
                return Err(LockError::Busy { pid: holder });
            }
            Some(holder) => {
                tracing::warn!(
                    "Reclaiming stale lock {} left by pid {}",
                    self.path.display(),
                    holder
                );
                true
            }
            // Present but unreadable records are stale too.
            None => self.path.exists(),
        };

        if reclaim {
            std::fs::write(&self.path, self.pid.to_string()).map_err(|source| {
                LockError::Write {
                    path: self.path.clone(),
                    source,
                }
            })?;
        } else {
            create_lock_file(&self.path, self.pid)?;
        }
        tracing::debug!("Acquired lock {} as pid {}", self.path.display(), self.pid);

        Ok(LockToken {
            path: self.path.clone(),
            pid: self.pid,
        })
    }

    /// Releases a held lock.
    ///
    /// # Errors
    ///
    /// Returns an error when the lock file exists but cannot be removed.
    pub fn release(&self, token: LockToken) -> Result<(), LockError> {
        remove_lock_file(&token.path)?;
        tracing::debug!("Released lock {}", token.path.display());
        Ok(())
    }
}

/// Deletes a lock file. A missing file is not an error.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be removed.
pub fn remove_lock_file(path: &Path) -> Result<(), LockError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LockError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Creates the lock file only if it does not exist yet. Losing the race to
/// another process reports that process as the holder.
fn create_lock_file(path: &Path, pid: u32) -> Result<(), LockError> {
    let write_error = |source| LockError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            return match read_holder(path)? {
                Some(holder) => Err(LockError::Busy { pid: holder }),
                None => Err(write_error(err)),
            };
        }
        Err(source) => return Err(write_error(source)),
    };
    file.write_all(pid.to_string().as_bytes())
        .map_err(write_error)
}

fn read_holder(path: &Path) -> Result<Option<u32>, LockError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LockError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match content.trim().parse::<u32>() {
        Ok(pid) => Ok(Some(pid)),
        Err(err) => {
            tracing::warn!(
                "Ignoring unreadable lock record in {}: {}",
                path.display(),
                err
            );
            Ok(None)
        }
    }
}
