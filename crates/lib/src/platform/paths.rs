use std::path::PathBuf;

/// Returns the user's home directory, if the environment provides one.
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE")
    .filter(|p| !p.is_empty())
    .map(PathBuf::from)
}

/// Returns the user's home directory, if the environment provides one.
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").filter(|p| !p.is_empty()).map(PathBuf::from)
}

/// Returns the value of an environment variable as a path, ignoring empty values.
pub fn env_path(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|p| !p.is_empty()).map(PathBuf::from)
}
