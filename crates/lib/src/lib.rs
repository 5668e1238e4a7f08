//! params-lib: crash-safe key/value store shared across processes.
//!
//! This crate provides the building blocks of the params store:
//! - `Store`: atomic put/get/remove/read-all over one file per key
//! - `StoreLock`: advisory lock serializing writers across processes
//! - `StorePaths`: resolves the store root for a mode
//! - `CancelToken`: cooperative cancellation for blocking reads

pub mod cancel;
pub mod consts;
pub mod platform;
pub mod store;
pub mod store_lock;
pub mod util;

pub use cancel::CancelToken;
pub use store::{Store, StoreError, StoreMode, StoreOptions, StorePaths, status_code};
pub use store_lock::{LockMode, StoreLock};
