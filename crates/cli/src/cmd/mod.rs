mod dump;
mod get;
mod info;
mod put;
mod remove;

pub use dump::cmd_dump;
pub use get::{cmd_get, cmd_get_bool};
pub use info::cmd_info;
pub use put::{cmd_put, cmd_put_bool};
pub use remove::cmd_remove;

use anyhow::{Context, Result};
use params_lib::{Store, StoreMode};

use crate::StoreArgs;

/// Open the store selected on the command line, creating it on first use.
pub(crate) fn open_store(args: &StoreArgs) -> Result<Store> {
  let mode = if args.persistent {
    StoreMode::Persistent
  } else {
    StoreMode::Default
  };

  Store::open_with(mode, args.root.as_deref()).context("Failed to open params store")
}
