//! Shared types, adapter traits, and error types for the Cairn settings store.
//!
//! The store crate and every storage adapter depend on this crate, so the
//! adapter seam lives here rather than next to the service that uses it.

pub mod error;
pub mod meta_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
