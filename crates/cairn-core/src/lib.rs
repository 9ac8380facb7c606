//! Settings store for the Cairn server.
//!
//! Server-wide configuration is a collection of key/value documents kept by a
//! [`MetaAdapter`](cairn_types::meta_adapter::MetaAdapter). Every key must have
//! a handler in the frozen registry; the handler validates and normalizes
//! values on write and may compute a default for reads of unset keys.
//!
//! Startup wiring:
//!
//! ```text
//! let mut registry = SettingsRegistry::new();
//! cairn_core::register_settings(&mut registry, deps)?;
//! let service = SettingsService::open(Arc::new(registry.freeze()), meta).await?;
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod core_settings;
pub mod entity;
pub mod plugin;
pub mod prelude;
pub mod request;
pub mod settings;

pub use core_settings::{CoreDeps, SettingKey};
pub use settings::{SettingsRegistry, SettingsService};

pub fn register_settings(
	registry: &mut settings::SettingsRegistry,
	deps: std::sync::Arc<CoreDeps>,
) -> cairn_types::error::ClResult<()> {
	core_settings::register_settings(registry, deps)
}

// vim: ts=4
