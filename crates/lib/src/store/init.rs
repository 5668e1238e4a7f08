//! First-use setup of a store root.
//!
//! The key directory is built off to the side and published under its final
//! name in one atomic step, so concurrent processes never observe a
//! half-built `d/`. Losing the publish race to another process counts as
//! success.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::{KEY_DIR_NAME, TMP_DIR_PREFIX};
use crate::util::fs::set_mode;

/// Error establishing a store root or its key directory.
#[derive(Debug, Error)]
pub enum PathError {
  #[error("failed to create store root {path}: {source}")]
  CreateRoot {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create temporary key directory in {path}: {source}")]
  CreateTemp {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to link temporary key directory {path}: {source}")]
  Link {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to install key directory {path}: {source}")]
  Publish {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("key directory {path} exists but is not a directory")]
  NotADirectory { path: PathBuf },

  #[error("failed to set permissions on {path}: {source}")]
  Permissions {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Make sure `root` and its key directory exist with world-writable permissions.
///
/// Safe to call concurrently from any number of processes. Returns the path
/// of the key directory.
pub fn ensure(root: &Path) -> Result<PathBuf, PathError> {
  if !root.exists() {
    create_root(root)?;
  }

  let key_dir = root.join(KEY_DIR_NAME);
  if !key_dir.exists() {
    install_key_dir(root, &key_dir)?;
  }
  if !key_dir.is_dir() {
    return Err(PathError::NotADirectory { path: key_dir });
  }

  // Another process may have won the install with a different umask.
  set_mode(&key_dir, 0o777).map_err(|source| PathError::Permissions {
    path: key_dir.clone(),
    source,
  })?;

  Ok(key_dir)
}

fn create_root(root: &Path) -> Result<(), PathError> {
  let mut builder = std::fs::DirBuilder::new();
  builder.recursive(true);

  #[cfg(unix)]
  {
    use std::os::unix::fs::DirBuilderExt;
    builder.mode(0o777);
  }

  match builder.create(root) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists && root.is_dir() => {}
    Err(source) => {
      return Err(PathError::CreateRoot {
        path: root.to_path_buf(),
        source,
      });
    }
  }

  set_mode(root, 0o777).map_err(|source| PathError::Permissions {
    path: root.to_path_buf(),
    source,
  })?;

  debug!(path = %root.display(), "created store root");
  Ok(())
}

fn install_key_dir(root: &Path, key_dir: &Path) -> Result<(), PathError> {
  let staging = tempfile::Builder::new()
    .prefix(TMP_DIR_PREFIX)
    .tempdir_in(root)
    .map_err(|source| PathError::CreateTemp {
      path: root.to_path_buf(),
      source,
    })?;

  set_mode(staging.path(), 0o777).map_err(|source| PathError::Permissions {
    path: staging.path().to_path_buf(),
    source,
  })?;

  match publish(root, staging.path(), key_dir)? {
    Published::Installed => {
      let staged = staging.keep();
      debug!(key_dir = %key_dir.display(), target = %staged.display(), "installed key directory");
    }
    Published::AlreadyPresent => {
      debug!(key_dir = %key_dir.display(), "key directory installed concurrently");
    }
  }

  Ok(())
}

enum Published {
  Installed,
  AlreadyPresent,
}

#[cfg(unix)]
fn publish(root: &Path, staged: &Path, key_dir: &Path) -> Result<Published, PathError> {
  let Some(staged_name) = staged.file_name() else {
    return Err(PathError::CreateTemp {
      path: staged.to_path_buf(),
      source: io::Error::other("temporary directory has no file name"),
    });
  };

  let mut link_name = staged_name.to_os_string();
  link_name.push(".link");
  let link_path = root.join(link_name);

  // Relative target so the store keeps working if its root is moved.
  std::os::unix::fs::symlink(staged_name, &link_path).map_err(|source| PathError::Link {
    path: link_path.clone(),
    source,
  })?;

  match rename_no_replace(&link_path, key_dir) {
    Ok(()) => Ok(Published::Installed),
    Err(source) => {
      remove_leftover_link(&link_path);
      if key_dir.symlink_metadata().is_ok() {
        Ok(Published::AlreadyPresent)
      } else {
        Err(PathError::Publish {
          path: key_dir.to_path_buf(),
          source,
        })
      }
    }
  }
}

#[cfg(windows)]
fn publish(_root: &Path, staged: &Path, key_dir: &Path) -> Result<Published, PathError> {
  match std::fs::rename(staged, key_dir) {
    Ok(()) => Ok(Published::Installed),
    Err(_) if key_dir.symlink_metadata().is_ok() => Ok(Published::AlreadyPresent),
    Err(source) => Err(PathError::Publish {
      path: key_dir.to_path_buf(),
      source,
    }),
  }
}

#[cfg(unix)]
fn remove_leftover_link(link_path: &Path) {
  if let Err(e) = std::fs::remove_file(link_path) {
    warn!(path = %link_path.display(), error = %e, "failed to remove unused key directory link");
  }
}

/// Rename `from` onto `to`, failing with `AlreadyExists` instead of replacing an existing entry.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
  use rustix::fs::{CWD, RenameFlags, renameat_with};
  use rustix::io::Errno;

  match renameat_with(CWD, from, CWD, to, RenameFlags::NOREPLACE) {
    Ok(()) => Ok(()),
    // Filesystems without RENAME_NOREPLACE support.
    Err(e) if e == Errno::INVAL || e == Errno::NOSYS => rename_checked(from, to),
    Err(e) => Err(io::Error::from_raw_os_error(e.raw_os_error())),
  }
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
fn rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
  rename_checked(from, to)
}

#[cfg(unix)]
fn rename_checked(from: &Path, to: &Path) -> io::Result<()> {
  if to.symlink_metadata().is_ok() {
    return Err(io::Error::from(io::ErrorKind::AlreadyExists));
  }
  std::fs::rename(from, to)
}
