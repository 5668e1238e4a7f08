//! File-based store locking for mutual exclusion.
//!
//! Every structural change to a store (put, remove) holds an exclusive lock on
//! `<root>/.lock`; `read_all` holds a shared one. The lock is advisory and
//! released when the guard is dropped, on every exit path.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use crate::util::fs::retry_eintr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
  Shared,
  Exclusive,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("Failed to open lock file {path}: {source}")]
  OpenFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to lock {path}: {source}")]
  LockFailed {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Held advisory lock; dropping it closes the descriptor and releases the lock.
#[derive(Debug)]
pub struct StoreLock {
  _file: File,
  lock_path: PathBuf,
  mode: LockMode,
}

impl StoreLock {
  /// Block until the lock on `lock_path` is held in `mode`.
  pub fn acquire(lock_path: &Path, mode: LockMode) -> Result<Self, LockError> {
    let file = open_lock_file(lock_path)?;

    retry_eintr(|| lock(&file, mode, true)).map_err(|source| LockError::LockFailed {
      path: lock_path.to_path_buf(),
      source,
    })?;

    trace!(path = %lock_path.display(), ?mode, "lock acquired");
    Ok(StoreLock {
      _file: file,
      lock_path: lock_path.to_path_buf(),
      mode,
    })
  }

  /// Take the lock only if it is free right now; `Ok(None)` when another holder conflicts.
  pub fn try_acquire(lock_path: &Path, mode: LockMode) -> Result<Option<Self>, LockError> {
    let file = open_lock_file(lock_path)?;

    match retry_eintr(|| lock(&file, mode, false)) {
      Ok(()) => Ok(Some(StoreLock {
        _file: file,
        lock_path: lock_path.to_path_buf(),
        mode,
      })),
      Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
      Err(source) => Err(LockError::LockFailed {
        path: lock_path.to_path_buf(),
        source,
      }),
    }
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }

  pub fn mode(&self) -> LockMode {
    self.mode
  }
}

fn open_lock_file(lock_path: &Path) -> Result<File, LockError> {
  let mut options = OpenOptions::new();
  options.read(true).write(true).create(true).truncate(false);

  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o775);
  }

  retry_eintr(|| options.open(lock_path)).map_err(|source| LockError::OpenFile {
    path: lock_path.to_path_buf(),
    source,
  })
}

#[cfg(unix)]
fn lock(file: &File, mode: LockMode, block: bool) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  let operation = match (mode, block) {
    (LockMode::Shared, true) => FlockOperation::LockShared,
    (LockMode::Exclusive, true) => FlockOperation::LockExclusive,
    (LockMode::Shared, false) => FlockOperation::NonBlockingLockShared,
    (LockMode::Exclusive, false) => FlockOperation::NonBlockingLockExclusive,
  };

  flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn lock(file: &File, mode: LockMode, block: bool) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  let mut flags = match mode {
    LockMode::Shared => 0,
    LockMode::Exclusive => LOCKFILE_EXCLUSIVE_LOCK,
  };
  if !block {
    flags |= LOCKFILE_FAIL_IMMEDIATELY;
  }

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    let err = io::Error::last_os_error();
    // ERROR_LOCK_VIOLATION
    if err.raw_os_error() == Some(33) {
      return Err(io::Error::from(io::ErrorKind::WouldBlock));
    }
    Err(err)
  } else {
    Ok(())
  }
}
