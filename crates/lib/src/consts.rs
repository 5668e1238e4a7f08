//! Names and numbers shared by every part of the store.

use std::time::Duration;

/// Name of the key directory inside a store root.
pub const KEY_DIR_NAME: &str = "d";

/// Name of the advisory lock file inside a store root.
pub const LOCK_FILENAME: &str = ".lock";

/// Prefix of the temporary directory built while installing the key directory.
pub const TMP_DIR_PREFIX: &str = ".tmp_";

/// Prefix of the temporary file a value is written to before it is renamed into place.
pub const TMP_VALUE_PREFIX: &str = ".tmp_value_";

/// Interval between attempts of a blocking read.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on transparent retries of a syscall interrupted by a signal.
pub const EINTR_RETRY_LIMIT: usize = 100;

/// Environment variable overriding the default-mode store root.
pub const ROOT_ENV: &str = "PARAMS_ROOT";

/// Environment variable overriding the persistent-mode store root.
pub const PERSISTENT_ROOT_ENV: &str = "PARAMS_PERSISTENT_ROOT";

/// Status codes reported to collaborators that speak integers instead of `Result`.
pub mod status {
  pub const OK: i32 = 0;
  pub const ERR_IO: i32 = -1;
  pub const ERR_WRITE: i32 = -20;
  pub const ERR_INVALID_KEY: i32 = -21;
  pub const ERR_LOCK: i32 = -30;
  pub const ERR_PATH: i32 = -31;
  pub const ERR_NO_VALUE: i32 = -33;
}
