//! Platform-specific lookups.

pub mod paths;

/// Whether the crate was built for the on-device (embedded) partition layout.
pub const fn is_embedded() -> bool {
  cfg!(feature = "embedded")
}
