//! Process-level bridge from SIGINT/SIGTERM to cancellation.
//!
//! Install once at the process boundary (typically `main`). Handlers stay in
//! place for the life of the process; the store never touches signal
//! dispositions itself.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

use super::CancelToken;

/// Bumped once per delivered SIGINT/SIGTERM.
static GENERATION: AtomicU64 = AtomicU64::new(0);
static INSTALLED: Mutex<bool> = Mutex::new(false);

#[derive(Debug, Error)]
pub enum SignalError {
  #[error("failed to install handler for {signal}: {source}")]
  Install {
    signal: &'static str,
    #[source]
    source: std::io::Error,
  },
}

/// Number of SIGINT/SIGTERM deliveries since the bridge was installed.
pub fn generation() -> u64 {
  GENERATION.load(Ordering::SeqCst)
}

/// Install the bridge (idempotent) and return a token that fires on the next
/// SIGINT/SIGTERM. Signals delivered before the call do not affect it.
pub fn install() -> Result<CancelToken, SignalError> {
  let mut installed = INSTALLED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
  if !*installed {
    install_handlers()?;
    *installed = true;
    debug!("signal cancellation bridge installed");
  }
  Ok(CancelToken::new().observing_signals())
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: nix::libc::c_int) {
  GENERATION.fetch_add(1, Ordering::SeqCst);
}

#[cfg(unix)]
fn install_handlers() -> Result<(), SignalError> {
  use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

  let action = SigAction::new(SigHandler::Handler(on_signal), SaFlags::SA_RESTART, SigSet::empty());

  for signal in [Signal::SIGINT, Signal::SIGTERM] {
    // SAFETY: the handler only performs a lock-free atomic increment, which is async-signal-safe.
    unsafe { sigaction(signal, &action) }.map_err(|errno| SignalError::Install {
      signal: signal.as_str(),
      source: std::io::Error::from_raw_os_error(errno as i32),
    })?;
  }

  Ok(())
}

#[cfg(windows)]
fn install_handlers() -> Result<(), SignalError> {
  // Console control events are not bridged; tokens still honour cancel() and deadlines.
  Ok(())
}
