//! Implementation of `params remove`.

use std::process::ExitCode;

use anyhow::Result;

use params_lib::StoreError;

use super::open_store;
use crate::StoreArgs;
use crate::output::{OutputFormat, print_error, print_json, print_success};

pub fn cmd_remove(args: &StoreArgs, key: &str, output: OutputFormat) -> Result<ExitCode> {
  let store = open_store(args)?;

  let result = store.remove(key);
  let code = params_lib::status_code(&result);

  match result {
    Ok(()) => {
      if output.is_json() {
        print_json(&serde_json::json!({ "key": key, "removed": true, "status": code }))?;
      } else {
        print_success(&format!("Removed {}", key));
      }
      Ok(ExitCode::SUCCESS)
    }
    Err(StoreError::NotFound(_)) => {
      if output.is_json() {
        print_json(&serde_json::json!({ "key": key, "removed": false, "status": code }))?;
      } else {
        print_error(&format!("Key not found: {}", key));
      }
      Ok(ExitCode::FAILURE)
    }
    Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to remove {}", key))),
  }
}
