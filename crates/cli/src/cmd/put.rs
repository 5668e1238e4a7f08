//! Implementation of `params put` and `params put-bool`.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};

use super::open_store;
use crate::StoreArgs;
use crate::output::{OutputFormat, format_bytes, print_json, print_success};

pub fn cmd_put(
  args: &StoreArgs,
  key: &str,
  value: Option<String>,
  stdin: bool,
  output: OutputFormat,
) -> Result<ExitCode> {
  let bytes = if stdin {
    let mut buf = Vec::new();
    std::io::stdin()
      .read_to_end(&mut buf)
      .context("Failed to read value from stdin")?;
    buf
  } else {
    value.unwrap_or_default().into_bytes()
  };

  let store = open_store(args)?;
  store.put(key, &bytes).with_context(|| format!("Failed to store {}", key))?;

  if output.is_json() {
    print_json(&serde_json::json!({ "key": key, "bytes": bytes.len(), "status": 0 }))?;
  } else {
    print_success(&format!("Stored {} ({})", key, format_bytes(bytes.len() as u64)));
  }

  Ok(ExitCode::SUCCESS)
}

pub fn cmd_put_bool(args: &StoreArgs, key: &str, value: bool, output: OutputFormat) -> Result<ExitCode> {
  let store = open_store(args)?;
  store
    .put_bool(key, value)
    .with_context(|| format!("Failed to store {}", key))?;

  if output.is_json() {
    print_json(&serde_json::json!({ "key": key, "value": value, "status": 0 }))?;
  } else {
    print_success(&format!("Stored {} = {}", key, value));
  }

  Ok(ExitCode::SUCCESS)
}
