//! Settings service: validated get/set/unset over the meta adapter

use serde_json::Value;
use std::sync::Arc;

use cairn_types::meta_adapter::{ListSettingOptions, MetaAdapter};

use super::types::{FrozenSettingsRegistry, Setting};
use crate::prelude::*;

/// Field the uniqueness repair works on
const KEY_FIELD: &str = "key";

/// Settings service - main interface for reading and writing settings
pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	meta: Arc<dyn MetaAdapter>,
}

impl SettingsService {
	pub fn new(registry: Arc<FrozenSettingsRegistry>, meta: Arc<dyn MetaAdapter>) -> Self {
		Self { registry, meta }
	}

	/// Create the service and repair the key index
	pub async fn open(
		registry: Arc<FrozenSettingsRegistry>,
		meta: Arc<dyn MetaAdapter>,
	) -> ClResult<Self> {
		let service = Self::new(registry, meta);
		service.reconnect().await?;
		Ok(service)
	}

	/// Get the stored value, falling back to the key's default (or null)
	pub async fn get(&self, key: &str) -> ClResult<Value> {
		match self.meta.find_setting(key).await? {
			Some(setting) => Ok(setting.value),
			None => Ok(self.default_value(key).unwrap_or(Value::Null)),
		}
	}

	/// Get the stored value, falling back to `default` if nothing is stored
	pub async fn get_or(&self, key: &str, default: Value) -> ClResult<Value> {
		match self.meta.find_setting(key).await? {
			Some(setting) => Ok(setting.value),
			None => Ok(default),
		}
	}

	/// Resolve the system default for a key
	///
	/// The static default table wins over the handler's default function.
	pub fn default_value(&self, key: &str) -> Option<Value> {
		if let Some(value) = self.registry.static_default(key) {
			return Some(value.clone());
		}
		self.registry.get_validator(key).and_then(|handler| handler.default_value())
	}

	/// Validate and store a value, replacing any existing one
	pub async fn set(&self, key: &str, value: Value) -> ClResult<Setting> {
		let setting = match self.meta.find_setting(key).await? {
			Some(mut existing) => {
				existing.value = value;
				existing
			}
			None => Setting::new(key, value),
		};

		let setting = self.validate(setting).await?;
		let saved = self.meta.save_setting(&setting).await?;

		info!("Setting '{}' updated", key);
		Ok(saved)
	}

	/// Remove every document stored for the key
	pub async fn unset(&self, key: &str) -> ClResult<()> {
		let opts = ListSettingOptions { key: Some(key.into()), prefix: None };
		for setting in self.meta.list_settings(&opts).await? {
			if let Some(id) = setting.id {
				self.meta.remove_setting(id).await?;
			}
		}

		info!("Setting '{}' unset", key);
		Ok(())
	}

	/// Check that the key is known and let its handler normalize the value
	pub async fn validate(&self, mut setting: Setting) -> ClResult<Setting> {
		let Some(handler) = self.registry.get_validator(&setting.key) else {
			return Err(Error::invalid_key(format!("Invalid setting key \"{}\".", setting.key)));
		};

		handler.validate(&mut setting).await?;
		Ok(setting)
	}

	/// Make sure a unique index on `key` exists
	///
	/// Older databases may carry a plain index on `key` and duplicate rows. Those
	/// indexes are dropped, every duplicate except the lowest id is deleted, and
	/// the unique index is created.
	pub async fn reconnect(&self) -> ClResult<()> {
		let indexes = self.meta.list_setting_indexes().await.unwrap_or_else(|err| {
			warn!("Cannot read setting indexes, assuming none: {}", err);
			Vec::new()
		});

		if indexes.iter().any(|index| index.is_unique_on(KEY_FIELD)) {
			debug!("Unique setting key index present");
			return Ok(());
		}

		// Composite unique indexes are left alone, they do not guard the key
		let plain_key_indexes =
			indexes.iter().filter(|index| !index.unique && index.leads_with(KEY_FIELD));
		for index in plain_key_indexes {
			info!("Dropping non-unique setting index {}", index.name);
			if let Err(err) = self.meta.drop_setting_index(&index.name).await {
				warn!("Cannot drop setting index {}: {}", index.name, err);
			}
		}

		for duplicate in self.meta.list_duplicate_settings().await? {
			warn!("Removing duplicate setting with key {}.", duplicate.key);
			let mut ids = duplicate.ids;
			ids.sort_unstable();
			for id in ids.into_iter().skip(1) {
				if let Err(err) = self.meta.remove_setting(id).await {
					warn!("Cannot remove duplicate setting {}: {}", id, err);
				}
			}
		}

		self.meta.create_setting_index(KEY_FIELD, true).await?;
		info!("Created unique setting key index");
		Ok(())
	}

	/// Stored settings, optionally restricted to a key prefix
	pub async fn list(&self, prefix: Option<&str>) -> ClResult<Vec<Setting>> {
		let opts = ListSettingOptions { key: None, prefix: prefix.map(Into::into) };
		self.meta.list_settings(&opts).await
	}

	/// Type-safe getters: `None` if the effective value is null
	pub async fn get_str(&self, key: &str) -> ClResult<Option<String>> {
		match self.get(key).await? {
			Value::Null => Ok(None),
			Value::String(s) => Ok(Some(s)),
			v => Err(type_mismatch(key, "a string", &v)),
		}
	}

	pub async fn get_int(&self, key: &str) -> ClResult<Option<i64>> {
		match self.get(key).await? {
			Value::Null => Ok(None),
			Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| {
				Error::invalid_value(format!("Setting '{}' is not an integer, got {}", key, n))
			}),
			v => Err(type_mismatch(key, "an integer", &v)),
		}
	}

	pub async fn get_bool(&self, key: &str) -> ClResult<Option<bool>> {
		match self.get(key).await? {
			Value::Null => Ok(None),
			Value::Bool(b) => Ok(Some(b)),
			v => Err(type_mismatch(key, "a boolean", &v)),
		}
	}

	/// Get reference to registry (for listing known keys)
	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}
}

fn type_mismatch(key: &str, expected: &str, got: &Value) -> Error {
	Error::invalid_value(format!("Setting '{}' is not {}, got {}", key, expected, got))
}

// vim: ts=4
