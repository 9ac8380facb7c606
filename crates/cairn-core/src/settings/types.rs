//! Settings registry types
//!
//! A key is only storable if a [`SettingHandler`] is registered for it. The
//! registry is filled once during startup through [`SettingsRegistry`] and then
//! frozen into a [`FrozenSettingsRegistry`] that the store holds.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::prelude::*;

pub use cairn_types::meta_adapter::Setting;

/// Type alias for a synchronous setting validator
pub type SettingValidatorFn = Box<dyn Fn(&mut Setting) -> ClResult<()> + Send + Sync>;

/// Type alias for a default-producing function
pub type SettingDefaultFn = Box<dyn Fn() -> Option<Value> + Send + Sync>;

/// Validation and default production for one setting key
#[async_trait]
pub trait SettingHandler: Send + Sync {
	/// Check `setting.value` and normalize it in place
	async fn validate(&self, setting: &mut Setting) -> ClResult<()>;

	/// Compute a fallback value for a key that has no stored document
	fn default_value(&self) -> Option<Value> {
		None
	}
}

/// Closure-based handler, built with [`SettingDefinition::builder`]
pub struct SettingDefinition {
	pub key: String,
	validator: Option<SettingValidatorFn>,
	default_fn: Option<SettingDefaultFn>,
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("validator", &self.validator.is_some())
			.field("default_fn", &self.default_fn.is_some())
			.finish()
	}
}

impl SettingDefinition {
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder { key: key.into(), validator: None, default_fn: None }
	}
}

#[async_trait]
impl SettingHandler for SettingDefinition {
	async fn validate(&self, setting: &mut Setting) -> ClResult<()> {
		match &self.validator {
			Some(validator) => validator(setting),
			// No validator registered: any value is acceptable
			None => Ok(()),
		}
	}

	fn default_value(&self) -> Option<Value> {
		self.default_fn.as_ref().and_then(|f| f())
	}
}

/// Builder for SettingDefinition with fluent API
pub struct SettingDefinitionBuilder {
	key: String,
	validator: Option<SettingValidatorFn>,
	default_fn: Option<SettingDefaultFn>,
}

impl SettingDefinitionBuilder {
	/// Set a validation function
	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&mut Setting) -> ClResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	/// Set a function computing the default value
	pub fn default_fn<F>(mut self, f: F) -> Self
	where
		F: Fn() -> Option<Value> + Send + Sync + 'static,
	{
		self.default_fn = Some(Box::new(f));
		self
	}

	pub fn build(self) -> ClResult<SettingDefinition> {
		if self.key.is_empty() {
			return Err(Error::ConfigError("Setting key must not be empty".into()));
		}
		Ok(SettingDefinition {
			key: self.key,
			validator: self.validator,
			default_fn: self.default_fn,
		})
	}
}

/// Mutable registry used during app initialization
pub struct SettingsRegistry {
	handlers: HashMap<String, Arc<dyn SettingHandler>>,
	defaults: HashMap<String, Value>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self { handlers: HashMap::new(), defaults: HashMap::new() }
	}

	/// Register the handler for a key
	pub fn register(
		&mut self,
		key: impl Into<String>,
		handler: Arc<dyn SettingHandler>,
	) -> ClResult<()> {
		let key = key.into();
		if self.handlers.contains_key(&key) {
			return Err(Error::ConfigError(format!("Setting '{}' is already registered", key)));
		}

		debug!("Registering setting: {}", key);
		self.handlers.insert(key, handler);
		Ok(())
	}

	/// Register a closure-based definition under its own key
	pub fn register_definition(&mut self, def: SettingDefinition) -> ClResult<()> {
		let key = def.key.clone();
		self.register(key, Arc::new(def))
	}

	/// Register a static default value, consulted before any handler default
	pub fn register_default(&mut self, key: impl Into<String>, value: Value) {
		self.defaults.insert(key.into(), value);
	}

	/// Freeze the registry (make it immutable)
	pub fn freeze(self) -> FrozenSettingsRegistry {
		info!("Freezing settings registry with {} handlers", self.handlers.len());
		FrozenSettingsRegistry { handlers: self.handlers, defaults: self.defaults }
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

impl Default for SettingsRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Immutable registry held by the settings service
pub struct FrozenSettingsRegistry {
	handlers: HashMap<String, Arc<dyn SettingHandler>>,
	defaults: HashMap<String, Value>,
}

impl FrozenSettingsRegistry {
	pub fn get_validator(&self, key: &str) -> Option<&Arc<dyn SettingHandler>> {
		self.handlers.get(key)
	}

	pub fn static_default(&self, key: &str) -> Option<&Value> {
		self.defaults.get(key)
	}

	/// Registered keys, sorted
	pub fn keys(&self) -> Vec<&str> {
		let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
		keys.sort_unstable();
		keys
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}


// vim: ts=4
