//! FFI bridge between the entry screen shell and `notecap_core`.
//!
//! Host side effects are returned to the shell as [`host::HostEffect`] values
//! instead of being performed from Rust.

pub mod api;
pub mod host;
