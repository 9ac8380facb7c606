//! Document store seam for settings and referenced entities.
//!
//! The settings store only talks to persistence through [`MetaAdapter`], so a
//! backend needs to provide document CRUD on the settings collection, index
//! introspection for the uniqueness repair, and a lookup for the users and
//! groups that some setting values reference.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::{DocId, EntityId, EntityKind};

/// One persisted key/value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
	#[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
	pub id: Option<DocId>,
	pub key: Box<str>,
	pub value: serde_json::Value,
}

impl Setting {
	/// A document that has not been saved yet
	pub fn new(key: impl Into<Box<str>>, value: serde_json::Value) -> Self {
		Self { id: None, key: key.into(), value }
	}
}

/// Filter for listing settings
#[derive(Debug, Default, Clone)]
pub struct ListSettingOptions {
	/// Exact key match
	pub key: Option<Box<str>>,
	/// Key prefix match
	pub prefix: Option<Box<str>>,
}

/// Description of one index on the settings collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
	pub name: Box<str>,
	/// Indexed fields in index order
	pub fields: Vec<Box<str>>,
	pub unique: bool,
}

impl IndexInfo {
	/// True if the first indexed field is `field`
	pub fn leads_with(&self, field: &str) -> bool {
		self.fields.first().is_some_and(|f| &**f == field)
	}

	/// True if this index alone makes `field` unique
	pub fn is_unique_on(&self, field: &str) -> bool {
		self.unique && self.fields.len() == 1 && self.leads_with(field)
	}
}

/// A key stored more than once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
	pub key: Box<str>,
	pub ids: Vec<DocId>,
	pub count: usize,
}

/// A user or group that settings may reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
	pub kind: EntityKind,
	pub id: EntityId,
	pub name: Box<str>,
}

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	// Settings
	//**********

	/// Read the document stored for `key`
	async fn find_setting(&self, key: &str) -> ClResult<Option<Setting>>;

	/// List documents matching the filter, ordered by key then id
	async fn list_settings(&self, opts: &ListSettingOptions) -> ClResult<Vec<Setting>>;

	/// Insert or update a document, returning it with its identity assigned
	///
	/// A document with an id is updated in place. A document without one is
	/// inserted; if the unique key index exists and the key is already
	/// present, the stored value is replaced instead of creating a duplicate.
	async fn save_setting(&self, setting: &Setting) -> ClResult<Setting>;

	/// Delete one document by identity
	async fn remove_setting(&self, id: DocId) -> ClResult<()>;

	// Index management
	//******************
	async fn list_setting_indexes(&self) -> ClResult<Vec<IndexInfo>>;
	async fn drop_setting_index(&self, name: &str) -> ClResult<()>;
	async fn create_setting_index(&self, field: &str, unique: bool) -> ClResult<()>;

	/// Group documents by key and return the groups with more than one member
	async fn list_duplicate_settings(&self) -> ClResult<Vec<DuplicateGroup>>;

	// Entities
	//**********
	async fn read_entity(&self, kind: EntityKind, id: &EntityId) -> ClResult<Option<Entity>>;
	async fn create_entity(&self, entity: &Entity) -> ClResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn index(fields: &[&str], unique: bool) -> IndexInfo {
		IndexInfo { name: "idx".into(), fields: fields.iter().map(|f| (*f).into()).collect(), unique }
	}

	#[test]
	fn test_is_unique_on_single_field_only() {
		assert!(index(&["key"], true).is_unique_on("key"));
		assert!(!index(&["key"], false).is_unique_on("key"));
		assert!(!index(&["key", "value"], true).is_unique_on("key"));
		assert!(index(&["key", "value"], true).leads_with("key"));
		assert!(!index(&["value"], true).is_unique_on("key"));
	}
}

// vim: ts=4
