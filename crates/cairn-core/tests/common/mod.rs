//! Shared test setup for the settings store
//!
//! [`MemoryMetaAdapter`] keeps the settings collection in memory and behaves
//! like the SQLite adapter where it matters: ids grow monotonically, a unique
//! key index turns inserts of existing keys into updates, and creating the
//! unique index fails while duplicates are present.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use cairn_core::core_settings::CoreDeps;
use cairn_core::entity::MetaEntityLookup;
use cairn_core::plugin::PluginCatalog;
use cairn_core::request::{NoRequestContext, RequestContext};
use cairn_core::settings::{SettingsRegistry, SettingsService};
use cairn_types::error::{ClResult, Error};
use cairn_types::meta_adapter::{
	DuplicateGroup, Entity, IndexInfo, ListSettingOptions, MetaAdapter, Setting,
};
use cairn_types::types::{DocId, EntityId, EntityKind};

#[derive(Debug, Default)]
struct MemoryState {
	settings: Vec<Setting>,
	indexes: Vec<IndexInfo>,
	entities: Vec<Entity>,
	next_id: i64,
	fail_index_info: bool,
	dropped: Vec<Box<str>>,
	created: usize,
}

#[derive(Debug, Default)]
pub struct MemoryMetaAdapter {
	state: Mutex<MemoryState>,
}

impl MemoryMetaAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a document without any uniqueness check
	pub fn insert_raw(&self, key: &str, value: Value) -> DocId {
		let mut state = self.state.lock();
		state.next_id += 1;
		let id = DocId(state.next_id);
		state.settings.push(Setting { id: Some(id), key: key.into(), value });
		id
	}

	pub fn add_index(&self, name: &str, fields: &[&str], unique: bool) {
		self.state.lock().indexes.push(IndexInfo {
			name: name.into(),
			fields: fields.iter().map(|f| (*f).into()).collect(),
			unique,
		});
	}

	pub fn fail_index_info(&self) {
		self.state.lock().fail_index_info = true;
	}

	pub fn add_entity(&self, kind: EntityKind, id: &str, name: &str) {
		let id = EntityId::parse(id).expect("valid entity id");
		self.state.lock().entities.push(Entity { kind, id, name: name.into() });
	}

	pub fn documents(&self, key: &str) -> Vec<Setting> {
		self.state.lock().settings.iter().filter(|s| &*s.key == key).cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.state.lock().settings.len()
	}

	pub fn indexes(&self) -> Vec<IndexInfo> {
		self.state.lock().indexes.clone()
	}

	pub fn dropped(&self) -> Vec<Box<str>> {
		self.state.lock().dropped.clone()
	}

	pub fn created(&self) -> usize {
		self.state.lock().created
	}
}

fn has_unique_key_index(state: &MemoryState) -> bool {
	state.indexes.iter().any(|index| index.is_unique_on("key"))
}

#[async_trait]
impl MetaAdapter for MemoryMetaAdapter {
	async fn find_setting(&self, key: &str) -> ClResult<Option<Setting>> {
		let state = self.state.lock();
		Ok(state.settings.iter().filter(|s| &*s.key == key).min_by_key(|s| s.id).cloned())
	}

	async fn list_settings(&self, opts: &ListSettingOptions) -> ClResult<Vec<Setting>> {
		let state = self.state.lock();
		let mut settings: Vec<Setting> = state
			.settings
			.iter()
			.filter(|s| opts.key.as_deref().is_none_or(|key| &*s.key == key))
			.filter(|s| opts.prefix.as_deref().is_none_or(|prefix| s.key.starts_with(prefix)))
			.cloned()
			.collect();
		settings.sort_by(|a, b| a.key.cmp(&b.key).then(a.id.cmp(&b.id)));
		Ok(settings)
	}

	async fn save_setting(&self, setting: &Setting) -> ClResult<Setting> {
		let mut state = self.state.lock();

		if let Some(id) = setting.id {
			if let Some(stored) = state.settings.iter_mut().find(|s| s.id == Some(id)) {
				stored.key = setting.key.clone();
				stored.value = setting.value.clone();
				return Ok(stored.clone());
			}
		}

		if has_unique_key_index(&state) {
			if let Some(stored) = state.settings.iter_mut().find(|s| s.key == setting.key) {
				stored.value = setting.value.clone();
				return Ok(stored.clone());
			}
		}

		state.next_id += 1;
		let saved = Setting { id: Some(DocId(state.next_id)), ..setting.clone() };
		state.settings.push(saved.clone());
		Ok(saved)
	}

	async fn remove_setting(&self, id: DocId) -> ClResult<()> {
		self.state.lock().settings.retain(|s| s.id != Some(id));
		Ok(())
	}

	async fn list_setting_indexes(&self) -> ClResult<Vec<IndexInfo>> {
		let state = self.state.lock();
		if state.fail_index_info {
			return Err(Error::DbError);
		}
		Ok(state.indexes.clone())
	}

	async fn drop_setting_index(&self, name: &str) -> ClResult<()> {
		let mut state = self.state.lock();
		state.indexes.retain(|index| &*index.name != name);
		state.dropped.push(name.into());
		Ok(())
	}

	async fn create_setting_index(&self, field: &str, unique: bool) -> ClResult<()> {
		let mut state = self.state.lock();
		if unique {
			let mut keys: Vec<&str> = state.settings.iter().map(|s| &*s.key).collect();
			keys.sort_unstable();
			if keys.windows(2).any(|pair| pair[0] == pair[1]) {
				return Err(Error::DbError);
			}
		}
		let name: Box<str> = format!("idx_settings_{}", field).into();
		state.indexes.push(IndexInfo { name, fields: vec![field.into()], unique });
		state.created += 1;
		Ok(())
	}

	async fn list_duplicate_settings(&self) -> ClResult<Vec<DuplicateGroup>> {
		let state = self.state.lock();
		let mut keys: Vec<Box<str>> = state.settings.iter().map(|s| s.key.clone()).collect();
		keys.sort_unstable();
		keys.dedup();

		Ok(keys
			.into_iter()
			.filter_map(|key| {
				// reverse order, so callers cannot rely on the adapter sorting ids
				let ids: Vec<DocId> =
					state.settings.iter().rev().filter(|s| s.key == key).filter_map(|s| s.id).collect();
				(ids.len() > 1).then(|| DuplicateGroup { key, count: ids.len(), ids })
			})
			.collect())
	}

	async fn read_entity(&self, kind: EntityKind, id: &EntityId) -> ClResult<Option<Entity>> {
		let state = self.state.lock();
		Ok(state.entities.iter().find(|e| e.kind == kind && &e.id == id).cloned())
	}

	async fn create_entity(&self, entity: &Entity) -> ClResult<()> {
		self.state.lock().entities.push(entity.clone());
		Ok(())
	}
}

pub fn catalog() -> PluginCatalog {
	let mut catalog = PluginCatalog::new();
	catalog.add("jobs", &[]).add("worker", &["jobs"]).add("thumbnails", &["worker"]);
	catalog
}

/// Service with the core settings registered against a fresh memory adapter
pub async fn create_test_service_with(
	request: Arc<dyn RequestContext>,
) -> (SettingsService, Arc<MemoryMetaAdapter>) {
	let meta = Arc::new(MemoryMetaAdapter::new());
	let deps = Arc::new(CoreDeps {
		plugins: Arc::new(catalog()),
		entities: Arc::new(MetaEntityLookup::new(meta.clone())),
		request,
	});

	let mut registry = SettingsRegistry::new();
	cairn_core::register_settings(&mut registry, deps).expect("core settings register");

	let service = SettingsService::open(Arc::new(registry.freeze()), meta.clone())
		.await
		.expect("service opens");
	(service, meta)
}

pub async fn create_test_service() -> (SettingsService, Arc<MemoryMetaAdapter>) {
	create_test_service_with(Arc::new(NoRequestContext)).await
}

pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// vim: ts=4
