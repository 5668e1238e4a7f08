//! Implementation of `params get` and `params get-bool`.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use params_lib::CancelToken;
use params_lib::cancel::signal;

use super::open_store;
use crate::StoreArgs;
use crate::output::{OutputFormat, json_value, print_json, print_raw, print_warning};

/// Print the value of `key`.
///
/// With `block`, waits until the key holds a non-empty value, the timeout
/// elapses, or the process receives SIGINT/SIGTERM. Exits with failure when
/// no value was obtained.
pub fn cmd_get(
  args: &StoreArgs,
  key: &str,
  block: bool,
  timeout: Option<Duration>,
  output: OutputFormat,
) -> Result<ExitCode> {
  let store = open_store(args)?;

  let value = if block {
    let mut token: CancelToken = signal::install().context("Failed to install signal handlers")?;
    if let Some(timeout) = timeout {
      token = token.with_timeout(timeout);
    }

    let start = Instant::now();
    let value = store
      .get_blocking(key, &token)
      .with_context(|| format!("Failed to read {}", key))?;
    debug!(key, waited = ?start.elapsed(), found = value.is_some(), "blocking get finished");
    value
  } else {
    store.get(key).with_context(|| format!("Failed to read {}", key))?
  };

  if output.is_json() {
    let rendered = value.as_deref().map(json_value).unwrap_or(serde_json::Value::Null);
    print_json(&serde_json::json!({ "key": key, "value": rendered }))?;
  } else {
    match &value {
      Some(value) => print_raw(value)?,
      None if block => print_warning(&format!("No value for {} (cancelled)", key)),
      None => print_warning(&format!("Key not found: {}", key)),
    }
  }

  Ok(if value.is_some() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

pub fn cmd_get_bool(args: &StoreArgs, key: &str, output: OutputFormat) -> Result<ExitCode> {
  let store = open_store(args)?;
  let value = store.get_bool(key).with_context(|| format!("Failed to read {}", key))?;

  if output.is_json() {
    print_json(&serde_json::json!({ "key": key, "value": value }))?;
  } else {
    println!("{}", value);
  }

  Ok(ExitCode::SUCCESS)
}
