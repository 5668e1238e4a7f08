//! The params store.
//!
//! One file per key under a key directory, written with
//! temp-file → fsync → rename → fsync-dir so readers only ever see complete
//! values. Writers serialize on an advisory lock; single-key readers take no
//! lock at all.
//!
//! # Layout
//!
//! ```text
//! <root>/                  0777
//! ├── .lock                advisory lock file (0775)
//! ├── .tmp_XXXXXX/         key directory contents (target of `d`)
//! └── d -> .tmp_XXXXXX     key directory, installed atomically
//!     ├── <key>            raw value bytes (0666)
//!     └── .tmp_value_*     in-flight write
//! ```

pub mod init;
pub mod paths;

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use crate::cancel::{CancelToken, poll_until};
use crate::consts::{DEFAULT_POLL_INTERVAL, LOCK_FILENAME, TMP_VALUE_PREFIX, status};
use crate::store_lock::{LockError, LockMode, StoreLock};
use crate::util::fs::{fsync_dir, set_file_mode};

pub use init::PathError;
pub use paths::{StoreMode, StorePaths};

#[derive(Debug, Error)]
pub enum StoreError {
  #[error(transparent)]
  Path(#[from] PathError),

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error("failed to write {key}: {source}")]
  Write {
    key: String,
    #[source]
    source: io::Error,
  },

  #[error("key not found: {0}")]
  NotFound(String),

  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid key {key:?}: {reason}")]
  InvalidKey { key: String, reason: &'static str },
}

impl StoreError {
  /// Integer status for collaborators that report `0`/negative codes.
  pub fn code(&self) -> i32 {
    match self {
      StoreError::Path(_) => status::ERR_PATH,
      StoreError::Lock(_) => status::ERR_LOCK,
      StoreError::Write { .. } => status::ERR_WRITE,
      StoreError::NotFound(_) => status::ERR_NO_VALUE,
      StoreError::Io { .. } => status::ERR_IO,
      StoreError::InvalidKey { .. } => status::ERR_INVALID_KEY,
    }
  }
}

/// Collapse an operation result into its integer status code.
pub fn status_code<T>(result: &Result<T, StoreError>) -> i32 {
  match result {
    Ok(_) => status::OK,
    Err(e) => e.code(),
  }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// How often a blocking read re-checks the key.
  pub poll_interval: Duration,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      poll_interval: DEFAULT_POLL_INTERVAL,
    }
  }
}

/// Handle to a store root. Cheap to clone; holds no open descriptors.
#[derive(Debug, Clone)]
pub struct Store {
  root: PathBuf,
  key_dir: PathBuf,
  lock_path: PathBuf,
  mode: StoreMode,
  options: StoreOptions,
}

impl Store {
  /// Open the store for `mode` at its resolved location.
  pub fn open(mode: StoreMode) -> Result<Self, StoreError> {
    Self::open_with(mode, None)
  }

  /// Open a store rooted at an explicit path.
  pub fn open_at(root: impl AsRef<Path>) -> Result<Self, StoreError> {
    Self::open_with(StoreMode::Default, Some(root.as_ref()))
  }

  /// Open a store, creating its root and key directory on first use.
  ///
  /// Fails if either cannot be established; a store without a key directory
  /// is unusable.
  pub fn open_with(mode: StoreMode, explicit: Option<&Path>) -> Result<Self, StoreError> {
    let root = StorePaths::resolve(mode, explicit);
    let key_dir = init::ensure(&root)?;
    let lock_path = root.join(LOCK_FILENAME);

    debug!(root = %root.display(), %mode, "opened store");
    Ok(Self {
      root,
      key_dir,
      lock_path,
      mode,
      options: StoreOptions::default(),
    })
  }

  pub fn with_options(mut self, options: StoreOptions) -> Self {
    self.options = options;
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn key_dir(&self) -> &Path {
    &self.key_dir
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }

  pub fn mode(&self) -> StoreMode {
    self.mode
  }

  /// Atomically replace the value of `key`.
  ///
  /// After return the key holds either its previous value (on error) or
  /// `value`, never a mix. A failed write leaves no temporary file behind.
  pub fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
    validate_key(key)?;
    let _lock = StoreLock::acquire(&self.lock_path, LockMode::Exclusive)?;

    let write_err = |source: io::Error| StoreError::Write {
      key: key.to_string(),
      source,
    };

    // Dropping the temp file on any early return unlinks it.
    let mut tmp = tempfile::Builder::new()
      .prefix(TMP_VALUE_PREFIX)
      .tempfile_in(&self.key_dir)
      .map_err(write_err)?;

    tmp.write_all(value).map_err(write_err)?;
    set_file_mode(tmp.as_file(), 0o666).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    let path = self.key_dir.join(key);
    tmp.persist(&path).map_err(|e| write_err(e.error))?;
    fsync_dir(&self.key_dir).map_err(write_err)?;

    debug!(key, bytes = value.len(), "wrote value");
    Ok(())
  }

  pub fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
    self.put(key, if value { b"1" } else { b"0" })
  }

  /// Read `key` without locking. `None` when the key is absent.
  pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    validate_key(key)?;
    read_value(&self.key_dir.join(key))
  }

  /// True only when `key` holds exactly `"1"`.
  pub fn get_bool(&self, key: &str) -> Result<bool, StoreError> {
    Ok(self.get(key)?.as_deref() == Some(b"1".as_slice()))
  }

  /// Poll `key` until it holds a non-empty value or `cancel` fires.
  ///
  /// Returns `Ok(None)` when cancelled. A key holding an empty value keeps
  /// the caller waiting.
  pub fn get_blocking(&self, key: &str, cancel: &CancelToken) -> Result<Option<Vec<u8>>, StoreError> {
    validate_key(key)?;
    let path = self.key_dir.join(key);

    trace!(key, interval = ?self.options.poll_interval, "waiting for value");
    poll_until::<Vec<u8>, StoreError, _>(self.options.poll_interval, cancel, || {
      let value = read_value(&path)?.filter(|value| !value.is_empty());
      trace!(key, ready = value.is_some(), "polled value");
      Ok(value)
    })
  }

  /// Delete `key`. Fails with [`StoreError::NotFound`] when it does not exist.
  pub fn remove(&self, key: &str) -> Result<(), StoreError> {
    validate_key(key)?;
    let _lock = StoreLock::acquire(&self.lock_path, LockMode::Exclusive)?;

    let path = self.key_dir.join(key);
    match std::fs::remove_file(&path) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(key.to_string())),
      Err(source) => {
        return Err(StoreError::Write {
          key: key.to_string(),
          source,
        });
      }
    }

    fsync_dir(&self.key_dir).map_err(|source| StoreError::Write {
      key: key.to_string(),
      source,
    })?;

    debug!(key, "removed value");
    Ok(())
  }

  /// Snapshot every key and its value.
  ///
  /// Holds the shared lock, so it never interleaves with a put or remove.
  /// Entries whose name does not start with an ASCII alphanumeric character
  /// (lock, temp and hidden files) are skipped.
  pub fn read_all(&self) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
    let _lock = StoreLock::acquire(&self.lock_path, LockMode::Shared)?;

    let io_err = |source: io::Error| StoreError::Io {
      path: self.key_dir.clone(),
      source,
    };

    let mut values = BTreeMap::new();
    for entry in std::fs::read_dir(&self.key_dir).map_err(io_err)? {
      let entry = entry.map_err(io_err)?;
      let file_name = entry.file_name();
      let Some(name) = file_name.to_str() else {
        trace!(name = ?file_name, "skipping non UTF-8 entry");
        continue;
      };
      if !starts_alphanumeric(name) {
        continue;
      }
      let path = entry.path();
      // Follows symlinks so a link to a directory is skipped too.
      match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
          trace!(name, "skipping non-file entry");
          continue;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
          trace!(name, "skipping dangling entry");
          continue;
        }
        Err(source) => return Err(StoreError::Io { path, source }),
      }

      let value = std::fs::read(&path).map_err(|source| StoreError::Io { path, source })?;
      values.insert(name.to_string(), value);
    }

    Ok(values)
  }
}

fn read_value(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
  match std::fs::read(path) {
    Ok(value) => Ok(Some(value)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(source) => Err(StoreError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}

fn starts_alphanumeric(name: &str) -> bool {
  name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

fn validate_key(key: &str) -> Result<(), StoreError> {
  let reason = if key.is_empty() {
    "key is empty"
  } else if !starts_alphanumeric(key) {
    "key must start with an ASCII letter or digit"
  } else if key.contains(['/', '\\', '\0']) {
    "key must not contain path separators or NUL"
  } else {
    return Ok(());
  };

  Err(StoreError::InvalidKey {
    key: key.to_string(),
    reason,
  })
}
