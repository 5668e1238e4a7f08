use std::process::ExitCode;

use anyhow::{Context, Result};

use params_lib::platform::is_embedded;

use super::open_store;
use crate::StoreArgs;
use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success};

pub fn cmd_info(args: &StoreArgs, output: OutputFormat) -> Result<ExitCode> {
  let store = open_store(args)?;
  let values = store.read_all().context("Failed to read store")?;
  let total: u64 = values.values().map(|v| v.len() as u64).sum();

  if output.is_json() {
    print_json(&serde_json::json!({
      "mode": store.mode(),
      "embedded": is_embedded(),
      "root": store.root(),
      "key_dir": store.key_dir(),
      "lock_file": store.lock_path(),
      "keys": values.len(),
      "value_bytes": total,
    }))?;
  } else {
    print_success(&format!("params v{}", env!("CARGO_PKG_VERSION")));
    print_stat("Mode", &store.mode().to_string());
    print_stat("Root", &store.root().display().to_string());
    print_stat("Key directory", &store.key_dir().display().to_string());
    print_stat("Lock file", &store.lock_path().display().to_string());
    print_stat("Keys", &values.len().to_string());
    print_stat("Size", &format_bytes(total));
  }

  Ok(ExitCode::SUCCESS)
}
