//! Filesystem helpers for durable, permission-aware writes.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::consts::EINTR_RETRY_LIMIT;

/// Run `op` again while it fails with `ErrorKind::Interrupted`, up to a fixed bound.
pub fn retry_eintr<T, F>(mut op: F) -> io::Result<T>
where
  F: FnMut() -> io::Result<T>,
{
  let mut attempts = 0;
  loop {
    match op() {
      Err(e) if e.kind() == io::ErrorKind::Interrupted && attempts < EINTR_RETRY_LIMIT => {
        attempts += 1;
      }
      result => return result,
    }
  }
}

/// Flush a directory's entries to durable storage so renames and unlinks in it survive a crash.
#[cfg(unix)]
pub fn fsync_dir(path: &Path) -> io::Result<()> {
  let dir = retry_eintr(|| File::open(path))?;
  dir.sync_all()
}

/// Directories cannot be opened as files on Windows; metadata is journaled by NTFS.
#[cfg(windows)]
pub fn fsync_dir(_path: &Path) -> io::Result<()> {
  Ok(())
}

/// Set the Unix permission bits of `path`, following symlinks.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;

  std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(windows)]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
  Ok(())
}

/// Set the Unix permission bits of an open file.
#[cfg(unix)]
pub fn set_file_mode(file: &File, mode: u32) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;

  file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(windows)]
pub fn set_file_mode(_file: &File, _mode: u32) -> io::Result<()> {
  Ok(())
}
