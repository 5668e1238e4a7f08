//! Implementation of `params dump`.
//!
//! Prints every key in the store, read under the shared lock so the listing
//! is a consistent snapshot.

use std::process::ExitCode;

use anyhow::{Context, Result};

use super::open_store;
use crate::StoreArgs;
use crate::output::{OutputFormat, json_value, print_info, print_json};

pub fn cmd_dump(args: &StoreArgs, output: OutputFormat) -> Result<ExitCode> {
  let store = open_store(args)?;
  let values = store.read_all().context("Failed to read store")?;

  if output.is_json() {
    let map: serde_json::Map<String, serde_json::Value> =
      values.iter().map(|(key, value)| (key.clone(), json_value(value))).collect();
    print_json(&map)?;
    return Ok(ExitCode::SUCCESS);
  }

  if values.is_empty() {
    print_info("Store is empty");
    return Ok(ExitCode::SUCCESS);
  }

  for (key, value) in &values {
    println!("{}={}", key, String::from_utf8_lossy(value));
  }

  Ok(ExitCode::SUCCESS)
}
