//! Store root resolution.
//!
//! Resolution order, first match wins:
//!
//! 1. an explicit path supplied by the caller,
//! 2. `PARAMS_PERSISTENT_ROOT` (persistent mode) or `PARAMS_ROOT`,
//! 3. the built-in location for the mode.
//!
//! On embedded builds the persistent root lives on a partition that survives
//! a reflash. Everywhere else persistent mode shares the default root.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::consts::{PERSISTENT_ROOT_ENV, ROOT_ENV};
use crate::platform::paths::env_path;

/// Location used when nothing else applies.
const FALLBACK_ROOT: &str = "/data/params";

#[cfg(feature = "embedded")]
const EMBEDDED_PERSISTENT_ROOT: &str = "/persist/comma/params";

/// Which class of storage a store is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
  #[default]
  Default,
  Persistent,
}

impl fmt::Display for StoreMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreMode::Default => write!(f, "default"),
      StoreMode::Persistent => write!(f, "persistent"),
    }
  }
}

pub struct StorePaths;

impl StorePaths {
  /// Resolve the root directory for `mode`, honouring an explicit override.
  pub fn resolve(mode: StoreMode, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
      return path.to_path_buf();
    }

    match mode {
      StoreMode::Default => Self::default_root(),
      StoreMode::Persistent => Self::persistent_root(),
    }
  }

  pub fn default_root() -> PathBuf {
    env_path(ROOT_ENV).unwrap_or_else(Self::builtin_default_root)
  }

  pub fn persistent_root() -> PathBuf {
    env_path(PERSISTENT_ROOT_ENV).unwrap_or_else(Self::builtin_persistent_root)
  }

  #[cfg(feature = "embedded")]
  pub fn builtin_default_root() -> PathBuf {
    PathBuf::from(FALLBACK_ROOT)
  }

  #[cfg(not(feature = "embedded"))]
  pub fn builtin_default_root() -> PathBuf {
    match crate::platform::paths::home_dir() {
      Some(home) => home.join(".comma").join("params"),
      None => PathBuf::from(FALLBACK_ROOT),
    }
  }

  #[cfg(feature = "embedded")]
  pub fn builtin_persistent_root() -> PathBuf {
    PathBuf::from(EMBEDDED_PERSISTENT_ROOT)
  }

  #[cfg(not(feature = "embedded"))]
  pub fn builtin_persistent_root() -> PathBuf {
    Self::default_root()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use temp_env::with_vars;

  #[test]
  #[serial]
  fn explicit_path_wins() {
    with_vars([(ROOT_ENV, Some("/env/root"))], || {
      let path = StorePaths::resolve(StoreMode::Default, Some(Path::new("/explicit")));
      assert_eq!(path, PathBuf::from("/explicit"));
    })
  }

  #[test]
  #[serial]
  fn env_var_overrides_default_paths() {
    with_vars(
      [
        (ROOT_ENV, Some("/custom/params")),
        (PERSISTENT_ROOT_ENV, Some("/custom/persist")),
      ],
      || {
        assert_eq!(
          StorePaths::resolve(StoreMode::Default, None),
          PathBuf::from("/custom/params")
        );
        assert_eq!(
          StorePaths::resolve(StoreMode::Persistent, None),
          PathBuf::from("/custom/persist")
        );
      },
    )
  }

  #[test]
  #[serial]
  #[cfg(all(unix, not(feature = "embedded")))]
  fn default_root_under_home() {
    with_vars(
      [(ROOT_ENV, None::<&str>), ("HOME", Some("/home/user"))],
      || {
        assert_eq!(
          StorePaths::resolve(StoreMode::Default, None),
          PathBuf::from("/home/user/.comma/params")
        );
      },
    )
  }

  #[test]
  #[serial]
  #[cfg(all(unix, not(feature = "embedded")))]
  fn missing_home_falls_back() {
    with_vars([(ROOT_ENV, None::<&str>), ("HOME", None::<&str>)], || {
      assert_eq!(StorePaths::default_root(), PathBuf::from(FALLBACK_ROOT));
    })
  }

  #[test]
  #[serial]
  #[cfg(not(feature = "embedded"))]
  fn persistent_shares_default_off_device() {
    with_vars(
      [
        (ROOT_ENV, Some("/custom/params")),
        (PERSISTENT_ROOT_ENV, None::<&str>),
      ],
      || {
        assert_eq!(
          StorePaths::resolve(StoreMode::Persistent, None),
          StorePaths::resolve(StoreMode::Default, None)
        );
      },
    )
  }

  #[test]
  fn mode_display() {
    assert_eq!(StoreMode::Default.to_string(), "default");
    assert_eq!(StoreMode::Persistent.to_string(), "persistent");
  }
}
