//! Core server settings
//!
//! The well-known keys every deployment has, their static defaults, and the
//! validation rules applied before a value is stored. Each [`SettingKey`] maps
//! to exactly one rule in [`CoreSettingHandler::validate`].

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::str::FromStr;
use std::sync::Arc;

use crate::entity::EntityLookup;
use crate::plugin::PluginResolver;
use crate::prelude::*;
use crate::request::RequestContext;
use crate::settings::{Setting, SettingHandler, SettingsRegistry};

pub const DEFAULT_UPLOAD_MINIMUM_CHUNK_SIZE: i64 = 1024 * 1024 * 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
	PluginsEnabled,
	AddToGroupPolicy,
	CollectionCreatePolicy,
	CookieLifetime,
	CorsAllowMethods,
	CorsAllowHeaders,
	CorsAllowOrigin,
	EmailFromAddress,
	EmailHost,
	RegistrationPolicy,
	EmailVerification,
	SmtpHost,
	SmtpPort,
	SmtpEncryption,
	SmtpUsername,
	SmtpPassword,
	UploadMinimumChunkSize,
	UserDefaultFolders,
}

impl SettingKey {
	pub const ALL: [SettingKey; 18] = [
		SettingKey::PluginsEnabled,
		SettingKey::AddToGroupPolicy,
		SettingKey::CollectionCreatePolicy,
		SettingKey::CookieLifetime,
		SettingKey::CorsAllowMethods,
		SettingKey::CorsAllowHeaders,
		SettingKey::CorsAllowOrigin,
		SettingKey::EmailFromAddress,
		SettingKey::EmailHost,
		SettingKey::RegistrationPolicy,
		SettingKey::EmailVerification,
		SettingKey::SmtpHost,
		SettingKey::SmtpPort,
		SettingKey::SmtpEncryption,
		SettingKey::SmtpUsername,
		SettingKey::SmtpPassword,
		SettingKey::UploadMinimumChunkSize,
		SettingKey::UserDefaultFolders,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			SettingKey::PluginsEnabled => "core.plugins_enabled",
			SettingKey::AddToGroupPolicy => "core.add_to_group_policy",
			SettingKey::CollectionCreatePolicy => "core.collection_create_policy",
			SettingKey::CookieLifetime => "core.cookie_lifetime",
			SettingKey::CorsAllowMethods => "core.cors.allow_methods",
			SettingKey::CorsAllowHeaders => "core.cors.allow_headers",
			SettingKey::CorsAllowOrigin => "core.cors.allow_origin",
			SettingKey::EmailFromAddress => "core.email_from_address",
			SettingKey::EmailHost => "core.email_host",
			SettingKey::RegistrationPolicy => "core.registration_policy",
			SettingKey::EmailVerification => "core.email_verification",
			SettingKey::SmtpHost => "core.smtp_host",
			SettingKey::SmtpPort => "core.smtp.port",
			SettingKey::SmtpEncryption => "core.smtp.encryption",
			SettingKey::SmtpUsername => "core.smtp.username",
			SettingKey::SmtpPassword => "core.smtp.password",
			SettingKey::UploadMinimumChunkSize => "core.upload_minimum_chunk_size",
			SettingKey::UserDefaultFolders => "core.user_default_folders",
		}
	}

	/// Literal default used when nothing is stored
	pub fn static_default(&self) -> Option<Value> {
		let value = match self {
			SettingKey::PluginsEnabled => json!([]),
			SettingKey::AddToGroupPolicy => json!("never"),
			SettingKey::CollectionCreatePolicy => json!({"open": false, "groups": [], "users": []}),
			SettingKey::CookieLifetime => json!(180),
			SettingKey::CorsAllowMethods => json!("GET, POST, PUT, HEAD, DELETE"),
			SettingKey::CorsAllowHeaders => json!(
				"Accept-Encoding, Authorization, Content-Disposition, Content-Type, Cookie, Cairn-Authorization, Cairn-Token"
			),
			SettingKey::EmailFromAddress => json!("Cairn <no-reply@cairn.local>"),
			SettingKey::RegistrationPolicy => json!("open"),
			SettingKey::EmailVerification => json!("disabled"),
			SettingKey::SmtpHost => json!("localhost"),
			SettingKey::SmtpPort => json!(25),
			SettingKey::SmtpEncryption => json!("none"),
			SettingKey::SmtpUsername | SettingKey::SmtpPassword => json!(""),
			SettingKey::UploadMinimumChunkSize => json!(DEFAULT_UPLOAD_MINIMUM_CHUNK_SIZE),
			SettingKey::UserDefaultFolders => json!("public_private"),
			SettingKey::CorsAllowOrigin | SettingKey::EmailHost => return None,
		};
		Some(value)
	}
}

impl FromStr for SettingKey {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		SettingKey::ALL
			.into_iter()
			.find(|key| key.as_str() == s)
			.ok_or_else(|| Error::invalid_key(format!("Invalid setting key \"{}\".", s)))
	}
}

impl std::fmt::Display for SettingKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Collaborators the core validators and defaults reach out to
pub struct CoreDeps {
	pub plugins: Arc<dyn PluginResolver>,
	pub entities: Arc<dyn EntityLookup>,
	pub request: Arc<dyn RequestContext>,
}

/// Handler for one core key
pub struct CoreSettingHandler {
	key: SettingKey,
	deps: Arc<CoreDeps>,
}

impl CoreSettingHandler {
	pub fn new(key: SettingKey, deps: Arc<CoreDeps>) -> Self {
		Self { key, deps }
	}
}

#[async_trait]
impl SettingHandler for CoreSettingHandler {
	async fn validate(&self, setting: &mut Setting) -> ClResult<()> {
		match self.key {
			SettingKey::PluginsEnabled => validate_plugins_enabled(setting, &*self.deps.plugins),
			SettingKey::AddToGroupPolicy => validate_one_of_lower(
				setting,
				&["never", "noadmin", "nomod", "yesadmin", "yesmod", ""],
				"Add to group policy must be one of \"never\", \"noadmin\", \"nomod\", \"yesadmin\", or \"yesmod\".",
			),
			SettingKey::CollectionCreatePolicy => {
				validate_collection_create_policy(setting, &*self.deps.entities).await
			}
			SettingKey::CookieLifetime => {
				validate_int(setting, 1, "Cookie lifetime must be an integer > 0.")
			}
			SettingKey::CorsAllowMethods => validate_cors_list(
				setting,
				|method| method.to_uppercase(),
				"Allowed methods must be a comma-separated list or an empty string.",
			),
			SettingKey::CorsAllowHeaders => validate_cors_list(
				setting,
				str::to_string,
				"Allowed headers must be a comma-separated list or an empty string.",
			),
			SettingKey::CorsAllowOrigin => validate_cors_list(
				setting,
				|origin| origin.trim_end_matches('/').to_string(),
				"Allowed origin must be a comma-separated list of base urls or * or an empty string.",
			),
			SettingKey::EmailFromAddress => {
				validate_not_blank(setting, "Email from address must not be blank.")
			}
			SettingKey::EmailHost => match &setting.value {
				Value::String(host) => {
					setting.value = Value::String(host.trim().to_string());
					Ok(())
				}
				_ => Err(Error::invalid_value("Email host must be a string.")),
			},
			SettingKey::RegistrationPolicy => validate_one_of_lower(
				setting,
				&["open", "closed", "approve"],
				"Registration policy must be \"open\", \"closed\", or \"approve\".",
			),
			SettingKey::EmailVerification => validate_one_of_lower(
				setting,
				&["required", "optional", "disabled"],
				"Email verification must be \"required\", \"optional\", or \"disabled\".",
			),
			SettingKey::SmtpHost => validate_not_blank(setting, "SMTP host must not be blank."),
			SettingKey::SmtpPort => validate_int(setting, 1, "SMTP port must be an integer > 0."),
			SettingKey::SmtpEncryption => validate_one_of(
				setting,
				&["none", "starttls", "ssl"],
				"SMTP encryption must be one of \"none\", \"starttls\", or \"ssl\".",
			),
			// any value is acceptable
			SettingKey::SmtpUsername | SettingKey::SmtpPassword => Ok(()),
			SettingKey::UploadMinimumChunkSize => {
				validate_int(setting, 0, "Upload minimum chunk size must be an integer >= 0.")
			}
			SettingKey::UserDefaultFolders => validate_one_of(
				setting,
				&["public_private", "none"],
				"User default folders must be either \"public_private\" or \"none\".",
			),
		}
	}

	fn default_value(&self) -> Option<Value> {
		match self.key {
			SettingKey::EmailHost => {
				self.deps.request.current_request().map(|req| Value::String(req.base_url()))
			}
			_ => None,
		}
	}
}

/// Register all core settings and their static defaults
pub fn register_settings(registry: &mut SettingsRegistry, deps: Arc<CoreDeps>) -> ClResult<()> {
	for key in SettingKey::ALL {
		registry.register(key.as_str(), Arc::new(CoreSettingHandler::new(key, deps.clone())))?;
		if let Some(value) = key.static_default() {
			registry.register_default(key.as_str(), value);
		}
	}
	Ok(())
}

// Validation helpers
//********************

/// Integer conversion accepting numbers, booleans and numeric strings
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn parse_int(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				return Some(i);
			}
			// above i64::MAX
			if n.is_u64() {
				return None;
			}
			// floats truncate toward zero, out of range ones are rejected
			n.as_f64()
				.map(f64::trunc)
				.filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
				.map(|f| f as i64)
		}
		Value::Bool(b) => Some(i64::from(*b)),
		Value::String(s) => s.trim().parse::<i64>().ok(),
		_ => None,
	}
}

/// Null, false, zero, and empty strings or containers
pub fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Bool(b) => !b,
		Value::Number(n) => n.as_f64() == Some(0.0),
		Value::String(s) => s.is_empty(),
		Value::Array(a) => a.is_empty(),
		Value::Object(o) => o.is_empty(),
	}
}

/// Split on commas and whitespace, map each entry, drop repeats keeping the first
pub fn normalize_list(value: &str, map: impl Fn(&str) -> String) -> String {
	let mut entries: Vec<String> = Vec::new();
	for entry in value.split(|c: char| c == ',' || c.is_whitespace()).filter(|e| !e.is_empty()) {
		let entry = map(entry);
		if !entries.contains(&entry) {
			entries.push(entry);
		}
	}
	entries.join(", ")
}

fn validate_int(setting: &mut Setting, min: i64, message: &str) -> ClResult<()> {
	match parse_int(&setting.value) {
		Some(n) if n >= min => {
			setting.value = Value::from(n);
			Ok(())
		}
		_ => Err(Error::invalid_value(message)),
	}
}

fn validate_not_blank(setting: &Setting, message: &str) -> ClResult<()> {
	if is_blank(&setting.value) {
		return Err(Error::invalid_value(message));
	}
	Ok(())
}

fn validate_one_of(setting: &Setting, allowed: &[&str], message: &str) -> ClResult<()> {
	match setting.value.as_str() {
		Some(s) if allowed.contains(&s) => Ok(()),
		_ => Err(Error::invalid_value(message)),
	}
}

fn validate_one_of_lower(setting: &mut Setting, allowed: &[&str], message: &str) -> ClResult<()> {
	let Some(lower) = setting.value.as_str().map(str::to_lowercase) else {
		return Err(Error::invalid_value(message));
	};
	if !allowed.contains(&lower.as_str()) {
		return Err(Error::invalid_value(message));
	}
	setting.value = Value::String(lower);
	Ok(())
}

fn validate_cors_list(
	setting: &mut Setting,
	map: impl Fn(&str) -> String,
	message: &str,
) -> ClResult<()> {
	let Value::String(list) = &setting.value else {
		return Err(Error::invalid_value(message));
	};
	setting.value = Value::String(normalize_list(list, map));
	Ok(())
}

fn validate_plugins_enabled(setting: &mut Setting, plugins: &dyn PluginResolver) -> ClResult<()> {
	const MESSAGE: &str = "Plugins enabled setting must be a list.";

	let Value::Array(items) = &setting.value else {
		return Err(Error::invalid_value(MESSAGE));
	};
	let names = items
		.iter()
		.map(|item| item.as_str().map(str::to_string))
		.collect::<Option<Vec<_>>>()
		.ok_or_else(|| Error::invalid_value(MESSAGE))?;

	let sorted = plugins.toposorted_plugins(&names)?;
	setting.value = Value::Array(sorted.into_iter().map(Value::String).collect());
	Ok(())
}

async fn validate_collection_create_policy(
	setting: &mut Setting,
	entities: &dyn EntityLookup,
) -> ClResult<()> {
	let Value::Object(policy) = &mut setting.value else {
		return Err(Error::invalid_value("Collection creation policy must be a JSON object."));
	};

	resolve_entity_ids(policy, "groups", EntityKind::Group, entities).await?;
	resolve_entity_ids(policy, "users", EntityKind::User, entities).await?;

	policy.entry("open").or_insert(Value::Bool(false));
	Ok(())
}

/// Replace every id listed under `field` by its canonical form, failing on unknown ids
async fn resolve_entity_ids(
	policy: &mut Map<String, Value>,
	field: &str,
	kind: EntityKind,
	entities: &dyn EntityLookup,
) -> ClResult<()> {
	let Some(ids) = policy.get_mut(field) else {
		return Ok(());
	};
	let Value::Array(ids) = ids else {
		return Err(Error::invalid_value(format!(
			"Collection creation policy {} must be a list.",
			field
		)));
	};

	for id in ids.iter_mut() {
		let entity_id = EntityId::from_value(id)?;
		entities.load(kind, &entity_id, true, true).await?;
		*id = Value::String(entity_id.to_string());
	}
	Ok(())
}


// vim: ts=4
