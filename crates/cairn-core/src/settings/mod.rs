//! Settings subsystem
//!
//! # Architecture
//!
//! - **Types** (`types.rs`): handler trait, closure definitions and the registry
//! - **Service** (`service.rs`): SettingsService with validation and index repair
//!
//! Built-in handlers for the core keys live in [`crate::core_settings`].

pub mod service;
pub mod types;

pub use service::SettingsService;
pub use types::{
	FrozenSettingsRegistry, Setting, SettingDefinition, SettingDefinitionBuilder, SettingHandler,
	SettingsRegistry,
};

// vim: ts=4
